//! Riffle: bounded-memory sort-merge grouping.
//!
//! This crate is the primary entrypoint for the riffle toolkit. It
//! re-exports the merge engine, the spillable value stores, and the tuple
//! data model from the underlying `riffle-*` crates, providing a unified
//! API surface for users.
//!
//! # Quick Start
//!
//! Co-group two sorted inputs by key:
//!
//! ```rust
//! use riffle::{MemSortedStream, MergeGroupEngine, SortedStream, tuple};
//!
//! let left = MemSortedStream::new(vec![
//!     (tuple![1], vec![tuple![1, "a"]]),
//!     (tuple![2], vec![tuple![2, "b"]]),
//! ]);
//! let right = MemSortedStream::new(vec![(tuple![2], vec![tuple![2, "c"]])]);
//! let sources: Vec<Box<dyn SortedStream>> = vec![Box::new(left), Box::new(right)];
//!
//! let mut groups_seen = Vec::new();
//! MergeGroupEngine::new(sources)
//!     .unwrap()
//!     .run(|key, groups| {
//!         let mut counts = [0usize; 2];
//!         for (ordinal, group) in groups.iter_mut().enumerate() {
//!             for value in group {
//!                 value?;
//!                 counts[ordinal] += 1;
//!             }
//!         }
//!         groups_seen.push((key.clone(), counts));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(
//!     groups_seen,
//!     vec![(tuple![1], [1, 0]), (tuple![2], [1, 1])]
//! );
//! ```
//!
//! # Architecture
//!
//! Riffle is organized as a layered workspace:
//!
//! - **Merge engine** (`riffle-merge`): sorted-stream cursors, minimum-key
//!   selection, co-group emission, and the secondary-sort adapter.
//! - **Spill layer** (`riffle-spill`): per-key bounded buffers backed by
//!   compressed scratch-file segments, with a shared value budget.
//! - **Data model** (`riffle-types`): tuples and values, key comparators,
//!   and the order-preserving tuple codec.
//! - **Errors** (`riffle-result`): the shared error enum and result alias.
//!
//! # Re-exports
//!
//! - [`MergeGroupEngine`]: the main grouping engine.
//! - [`spill`]: the bounded-buffer store layer for direct use.

// Re-export the merge engine as the primary user-facing API
pub use riffle_merge::{
    EngineState, GroupValues, MemSortedStream, MergeGroupEngine, MergeOptions,
    MergeSummary, SecondarySortAdapter, SortedStream, validate_merge_options,
};

// Re-export spill primitives for standalone bounded-buffer use
pub mod spill {
    //! Spillable value stores and their configuration.
    //!
    //! This module provides the [`SpillStore`] bounded buffer, the
    //! [`KeyedSpillMap`] budget-sharing map, and the scratch-file
    //! abstraction segments are written through.

    pub use riffle_spill::{
        KeyedSpillMap, ScratchFiles, SegmentReader, SpillCompression, SpillConfig,
        SpillSegment, SpillStore, StoreIter, TempScratch, validate_spill_config,
        write_segment,
    };
}

// Re-export result types for error handling
pub use riffle_result::{Error, Result};

// Re-export the tuple data model and the engine's pluggable seams
pub use riffle_types::{
    KeyComparator, NaturalKeyOrder, OrderedTupleCodec, Tuple, TupleCodec, Value, tuple,
};
