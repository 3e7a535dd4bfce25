//! Bounded-memory value storage for merge grouping.
//!
//! A grouping step has to hold every value of the current key for each
//! input, and a skewed key can carry far more values than fit in memory.
//! This crate caps what stays resident: each key's values live in a
//! [`SpillStore`] that buffers up to a threshold in memory and flushes
//! full buffers to scratch-file segments, and a [`KeyedSpillMap`] shares
//! one value budget across all keys it has seen, shrinking the threshold
//! handed to each newly created store.
//!
//! ## Contracts
//!
//! - The buffer never holds more than `threshold` values: the spill check
//!   runs before an append, so right after any spill the buffer is empty.
//! - A spill writes the whole buffer to exactly one segment; empty buffers
//!   never produce a segment file.
//! - Replay order is arrival order: segments oldest-first, then the
//!   in-memory tail, with at most one segment file open at a time.
//! - Map entries never age out. Once a key has been seen it keeps counting
//!   against the budget until [`KeyedSpillMap::close`], even after its
//!   store is released.
//!
//! Stores are single-threaded; callers that shard work hold one map per
//! worker.

#![forbid(unsafe_code)]

pub mod config;
pub mod map;
pub mod scratch;
pub mod segment;
pub mod store;

pub use config::{SpillCompression, SpillConfig, validate_spill_config};
pub use map::KeyedSpillMap;
pub use scratch::{ScratchFiles, TempScratch};
pub use segment::{SegmentReader, SpillSegment, write_segment};
pub use store::{SpillStore, StoreIter};
