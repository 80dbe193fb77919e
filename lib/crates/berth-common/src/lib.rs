#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod types;

pub use types::*;
