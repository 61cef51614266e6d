//! Shared utilities.
//!
//! Test helpers for building small configuration graphs.

#[cfg(test)]
pub mod testutil;
