//! Cross-module protocol flows.

mod flows;
mod wallet;
