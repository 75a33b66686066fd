//! # Siege Test Utilities
//!
//! Shared testing utilities for all crates:
//! - Fixture catalogs and a ready-to-drive siege harness
//! - Determinism test harness
//! - Property-based testing strategies (in [`determinism::strategies`])

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
