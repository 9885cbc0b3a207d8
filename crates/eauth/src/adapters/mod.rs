//! Adapters layer: concrete implementations at the process boundary.

pub mod http;
pub mod rpc;
