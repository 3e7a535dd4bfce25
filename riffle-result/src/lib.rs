//! Error types and result definitions for the riffle merge-grouping engine.
//!
//! This crate provides the unified error type ([`Error`]) and result alias
//! ([`Result<T>`]) used throughout the riffle crates. All fallible
//! operations return `Result<T>`, and errors propagate upward with the `?`
//! operator until they surface as a single terminal failure from the merge
//! engine's `run()`.
//!
//! # Error Philosophy
//!
//! One enum rather than per-crate error types:
//! - errors cross crate boundaries without conversion boilerplate,
//! - the outer task framework can match variants to decide whether a retry
//!   of the whole partition is worthwhile,
//! - memory pressure stays distinguishable from data corruption at a
//!   glance ([`Error::is_out_of_memory`]), even when wrapped with grouping
//!   context.
//!
//! There is no retry machinery here: a spill or codec failure is terminal
//! for the partition, and re-running the partition belongs to the caller.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
