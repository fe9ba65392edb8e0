// crates/lp_algo/src/lib.rs
#![forbid(unsafe_code)]

//! Pure decision logic: no I/O, no clock, no randomness.
//!
//! - [`classify`]: ticket vs. draw → prize tier (or no win)
//! - [`dedup`]: order-insensitive duplicate detection within a pool and draw

pub mod classify;
pub mod dedup;

pub use classify::{classify, classify_numbers, match_counts, Classification, ClassifyError};
pub use dedup::{find_duplicate, is_duplicate};
