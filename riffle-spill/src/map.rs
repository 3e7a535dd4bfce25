//! Keyed spill stores under one shared memory budget.

use std::collections::hash_map::Entry;
use std::sync::Arc;

use riffle_result::Result;
use riffle_types::{Tuple, TupleCodec};
use rustc_hash::FxHashMap;

use crate::config::{SpillCompression, SpillConfig, validate_spill_config};
use crate::scratch::ScratchFiles;
use crate::store::SpillStore;

/// Map from group key to [`SpillStore`], sharing one buffered-value
/// budget across every key it has seen.
///
/// A store's spill threshold is fixed when its key first appears:
/// `min(list_spill_threshold, map_value_budget / key_count)`, where
/// `key_count` includes the key being created, clamped to at least 1.
/// Later keys therefore get smaller in-memory windows while earlier
/// stores keep the threshold they were built with; the budget bounds
/// newly buffered data, it does not re-balance old buffers.
///
/// Entries are never evicted. [`KeyedSpillMap::release`] empties a key's
/// store but keeps the entry, so the key count only grows within a scan.
pub struct KeyedSpillMap {
    stores: FxHashMap<Tuple, SpillStore>,
    config: SpillConfig,
    compression: SpillCompression,
    codec: Arc<dyn TupleCodec>,
    scratch: Arc<dyn ScratchFiles>,
    hint: String,
    retired_spills: u64,
}

impl KeyedSpillMap {
    pub fn new(
        config: SpillConfig,
        codec: Arc<dyn TupleCodec>,
        scratch: Arc<dyn ScratchFiles>,
    ) -> Result<Self> {
        validate_spill_config(&config)?;
        let compression = config.resolve_compression();
        Ok(Self {
            stores: FxHashMap::default(),
            config,
            compression,
            codec,
            scratch,
            hint: "keyed".to_string(),
            retired_spills: 0,
        })
    }

    /// Tag scratch files and log lines from stores this map creates.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// Store for `key`, created on first sight with the threshold the
    /// current key count dictates.
    pub fn get_or_create(&mut self, key: &Tuple) -> Result<&mut SpillStore> {
        let key_count = self.stores.len() + 1;
        let threshold = self.threshold_for_key_count(key_count);
        match self.stores.entry(key.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                if threshold < self.config.list_spill_threshold {
                    tracing::debug!(
                        key = %entry.key(),
                        threshold,
                        key_count,
                        "budget shrank the spill threshold for a new key"
                    );
                }
                let store = SpillStore::new(
                    threshold,
                    self.compression,
                    Arc::clone(&self.codec),
                    Arc::clone(&self.scratch),
                )?
                .with_hint(self.hint.clone());
                Ok(entry.insert(store))
            }
        }
    }

    pub fn get(&self, key: &Tuple) -> Option<&SpillStore> {
        self.stores.get(key)
    }

    pub fn get_mut(&mut self, key: &Tuple) -> Option<&mut SpillStore> {
        self.stores.get_mut(key)
    }

    pub fn contains_key(&self, key: &Tuple) -> bool {
        self.stores.contains_key(key)
    }

    /// Distinct keys seen so far. Only grows; `release` does not shrink it.
    pub fn key_count(&self) -> usize {
        self.stores.len()
    }

    /// Cumulative segments written by every store this map created,
    /// including stores already released or closed.
    pub fn spill_count(&self) -> u64 {
        self.retired_spills
            + self
                .stores
                .values()
                .map(SpillStore::spill_count)
                .sum::<u64>()
    }

    /// Empty `key`'s store but keep its entry, so the key still counts
    /// against the budget for the rest of the scan.
    pub fn release(&mut self, key: &Tuple) {
        if let Some(store) = self.stores.get_mut(key) {
            self.retired_spills += store.spill_count();
            store.clear();
        }
    }

    /// Drop every store and entry. The cumulative spill count survives.
    pub fn close(&mut self) {
        self.retired_spills += self
            .stores
            .values()
            .map(SpillStore::spill_count)
            .sum::<u64>();
        self.stores.clear();
    }

    fn threshold_for_key_count(&self, key_count: usize) -> usize {
        let budget_share = self.config.map_value_budget / key_count.max(1);
        self.config.list_spill_threshold.min(budget_share).max(1)
    }
}
