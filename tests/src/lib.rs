//! # Eauth Test Suite
//!
//! End-to-end protocol flows against the public engine API: a test plays
//! both sides of a run, requesting a challenge and answering it with a real
//! client-side signature (or a scripted wallet contract).
//!
//! ```bash
//! cargo test -p eauth-tests
//! ```

#![allow(dead_code)]

pub mod helpers;
pub mod integration;
