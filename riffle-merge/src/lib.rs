//! Sort-merge grouping over pre-sorted inputs.
//!
//! This crate aligns N key-sorted streams on their common key order and
//! hands an aggregation callback one group at a time: the minimum pending
//! key plus, for every input ordinal, an iterable over that ordinal's
//! values for the key. Ordinals without the key get an explicit empty
//! iterable, which gives co-grouping full-outer semantics; a single input
//! degenerates to an ordinary group-by.
//!
//! Inputs implement [`SortedStream`] and are boxed per ordinal, so table
//! scans, network readers, and in-memory fixtures mix freely behind one
//! engine. Group values route through `riffle-spill` stores, so a skewed
//! key can exceed memory without breaking the one-callback-per-key
//! contract. [`SecondarySortAdapter`] layers value ordering on top by
//! folding composite `(group, sort)` keys back into logical groups.
//!
//! The engine is single-threaded and pull-based: callers shard inputs
//! upstream and run one engine per partition.
#![forbid(unsafe_code)]

mod cursor;

pub mod engine;
pub mod secondary;
pub mod stream;

use riffle_result::Result;
use riffle_spill::{SpillConfig, validate_spill_config};

pub use engine::{EngineState, GroupValues, MergeGroupEngine, MergeSummary};
pub use secondary::SecondarySortAdapter;
pub use stream::{MemSortedStream, SortedStream};

/// Options controlling a merge-group run.
#[derive(Clone, Debug)]
pub struct MergeOptions {
    /// Assert that each input's keys strictly ascend, failing fast with
    /// the offending ordinal instead of silently misgrouping. Costs one
    /// comparison per key; defaults on in debug builds only.
    pub check_ordering: bool,
    /// Spill behavior for buffered group values.
    pub spill: SpillConfig,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            check_ordering: cfg!(debug_assertions),
            spill: SpillConfig::default(),
        }
    }
}

impl MergeOptions {
    /// Enable or disable the per-key ordering assertion.
    pub fn with_check_ordering(mut self, check: bool) -> Self {
        self.check_ordering = check;
        self
    }

    /// Replace the spill configuration.
    pub fn with_spill(mut self, spill: SpillConfig) -> Self {
        self.spill = spill;
        self
    }
}

/// Validate merge options before execution.
pub fn validate_merge_options(options: &MergeOptions) -> Result<()> {
    validate_spill_config(&options.spill)
}
