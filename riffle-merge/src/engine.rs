//! N-way sort-merge grouping.
//!
//! The engine holds one cursor per input. Each round it fills every idle
//! cursor with its next key, banks that key's values in the ordinal's
//! [`KeyedSpillMap`], picks the minimum pending key under the grouping
//! comparator, and hands the caller one [`GroupValues`] iterator per
//! ordinal. Inputs whose pending key compares equal to the minimum
//! participate; the rest sit out with an explicit empty group, which is
//! what makes an emission a full outer co-group rather than an inner
//! join. Released stores keep their map entry, so a key seen again later
//! (out of order, with checks off) still charges the same budget slot.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;

use riffle_result::{Error, Result};
use riffle_spill::{KeyedSpillMap, ScratchFiles, StoreIter, TempScratch};
use riffle_types::{KeyComparator, NaturalKeyOrder, OrderedTupleCodec, Tuple, TupleCodec};

use crate::cursor::SortedStreamCursor;
use crate::stream::SortedStream;
use crate::{MergeOptions, validate_merge_options};

/// Phase the engine was last observed in. Purely observational; the
/// engine never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Filling idle cursors and banking their values.
    AwaitCursors,
    /// A minimum pending key has been chosen.
    KeySelected,
    /// Group iterators are in the caller's hands.
    ValuesAssembled,
    /// The callback returned and participating stores were released.
    Emitted,
    /// Every input is exhausted.
    Drained,
}

/// Totals from one completed [`MergeGroupEngine::run`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MergeSummary {
    /// Distinct keys handed to the callback.
    pub keys_emitted: u64,
    /// Values routed through the per-ordinal stores.
    pub values_delivered: u64,
    /// Spill segments written, indexed by ordinal.
    pub spills: Vec<u64>,
}

/// Values of one ordinal under the key being emitted, in arrival order.
///
/// `Empty` is a real iterator, not a null: an ordinal that lacks the key
/// (or carries it with zero values) still occupies its slot in the
/// callback's group array.
pub enum GroupValues<'a> {
    Empty,
    Store(StoreIter<'a>),
}

impl<'a> Iterator for GroupValues<'a> {
    type Item = Result<Cow<'a, Tuple>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            GroupValues::Empty => None,
            GroupValues::Store(iter) => iter.next(),
        }
    }
}

/// Streaming co-group over N sorted inputs.
///
/// Generic over the grouping comparator, defaulting to the natural order
/// of [`Tuple`]. The codec and scratch provider are swappable through
/// builders; the defaults write order-preserving frames into
/// process-temp scratch files.
pub struct MergeGroupEngine<C: KeyComparator = NaturalKeyOrder> {
    cursors: Vec<SortedStreamCursor>,
    comparator: C,
    options: MergeOptions,
    codec: Arc<dyn TupleCodec>,
    scratch: Arc<dyn ScratchFiles>,
    state: EngineState,
}

impl MergeGroupEngine<NaturalKeyOrder> {
    /// Engine over `sources` grouped by the natural tuple order.
    pub fn new(sources: Vec<Box<dyn SortedStream>>) -> Result<Self> {
        Self::with_comparator(sources, NaturalKeyOrder)
    }
}

impl<C: KeyComparator> MergeGroupEngine<C> {
    /// Engine over `sources` grouped by `comparator`.
    ///
    /// The comparator defines both the emission order and key equality
    /// for participation; every input must already be sorted by it.
    pub fn with_comparator(
        sources: Vec<Box<dyn SortedStream>>,
        comparator: C,
    ) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::InvalidArgumentError(
                "merge requires at least one sorted input".to_string(),
            ));
        }
        let cursors = sources
            .into_iter()
            .enumerate()
            .map(|(ordinal, stream)| SortedStreamCursor::new(stream, ordinal))
            .collect();
        Ok(Self {
            cursors,
            comparator,
            options: MergeOptions::default(),
            codec: Arc::new(OrderedTupleCodec),
            scratch: Arc::new(TempScratch::new()),
            state: EngineState::AwaitCursors,
        })
    }

    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn TupleCodec>) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_scratch(mut self, scratch: Arc<dyn ScratchFiles>) -> Self {
        self.scratch = scratch;
        self
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Drain every input, invoking `on_group` once per distinct key in
    /// ascending comparator order.
    ///
    /// Each invocation gets the key plus one [`GroupValues`] per
    /// ordinal, index-aligned with the construction order of the
    /// sources. Values a callback wants to keep past its own return must
    /// be cloned out of the [`Cow`]s.
    ///
    /// Errors raised while a key is in flight (banking its values,
    /// running the callback) come back wrapped in [`Error::Aggregate`]
    /// naming the key, the last key that completed, and the per-ordinal
    /// spill counts. Ordering violations propagate unwrapped. Nothing
    /// already delivered is rolled back; scratch files are removed as
    /// the run state drops.
    pub fn run<F>(&mut self, mut on_group: F) -> Result<MergeSummary>
    where
        F: FnMut(&Tuple, &mut [GroupValues<'_>]) -> Result<()>,
    {
        validate_merge_options(&self.options)?;
        let mut maps = Vec::with_capacity(self.cursors.len());
        for ordinal in 0..self.cursors.len() {
            let map = KeyedSpillMap::new(
                self.options.spill.clone(),
                Arc::clone(&self.codec),
                Arc::clone(&self.scratch),
            )?
            .with_hint(format!("ord{ordinal}"));
            maps.push(map);
        }

        let comparator = &self.comparator;
        let check_ordering = self.options.check_ordering;
        let mut keys_emitted = 0u64;
        let mut values_delivered = 0u64;
        let mut last_emitted: Option<Tuple> = None;

        loop {
            self.state = EngineState::AwaitCursors;
            for ordinal in 0..self.cursors.len() {
                let cursor = &mut self.cursors[ordinal];
                if !cursor.fill(comparator, check_ordering)? {
                    continue;
                }
                let Some(key) = cursor.pending().cloned() else {
                    continue;
                };
                match drain_cursor_values(cursor, &mut maps[ordinal], &key) {
                    Ok(count) => values_delivered += count,
                    Err(err) => {
                        return Err(aggregate_context(&key, last_emitted.as_ref(), &maps, err));
                    }
                }
            }

            // Lowest pending key wins; the first ordinal holding it keeps
            // ties, so emission is deterministic under equal keys.
            let mut lead_key: Option<Tuple> = None;
            for cursor in &self.cursors {
                let Some(key) = cursor.pending() else {
                    continue;
                };
                let lower = match &lead_key {
                    Some(best) => comparator.compare(key, best) == Ordering::Less,
                    None => true,
                };
                if lower {
                    lead_key = Some(key.clone());
                }
            }
            let Some(lead_key) = lead_key else {
                self.state = EngineState::Drained;
                break;
            };
            self.state = EngineState::KeySelected;

            let callback_result = {
                let mut groups: Vec<GroupValues<'_>> =
                    Vec::with_capacity(self.cursors.len());
                for (ordinal, cursor) in self.cursors.iter().enumerate() {
                    // A participant's store is looked up by its own
                    // pending key: under a coarser comparator that key
                    // may differ byte-wise from the lead key.
                    let group = match cursor.pending() {
                        Some(key)
                            if comparator.compare(key, &lead_key) == Ordering::Equal =>
                        {
                            match maps[ordinal].get(key) {
                                Some(store) => GroupValues::Store(store.iter()),
                                None => GroupValues::Empty,
                            }
                        }
                        _ => GroupValues::Empty,
                    };
                    groups.push(group);
                }
                self.state = EngineState::ValuesAssembled;
                on_group(&lead_key, &mut groups)
            };
            if let Err(err) = callback_result {
                return Err(aggregate_context(
                    &lead_key,
                    last_emitted.as_ref(),
                    &maps,
                    err,
                ));
            }

            for (ordinal, cursor) in self.cursors.iter_mut().enumerate() {
                let participates = cursor
                    .pending()
                    .is_some_and(|key| comparator.compare(key, &lead_key) == Ordering::Equal);
                if participates {
                    if let Some(key) = cursor.take_pending() {
                        maps[ordinal].release(&key);
                    }
                }
            }

            keys_emitted += 1;
            last_emitted = Some(lead_key);
            self.state = EngineState::Emitted;
        }

        let spills: Vec<u64> = maps.iter().map(KeyedSpillMap::spill_count).collect();
        for map in &mut maps {
            map.close();
        }
        tracing::debug!(keys_emitted, values_delivered, ?spills, "merge run drained");
        Ok(MergeSummary {
            keys_emitted,
            values_delivered,
            spills,
        })
    }
}

/// Pull every value of `key` out of `cursor` and bank it.
///
/// The store is created on the first value, so a key arriving with an
/// empty group never allocates one.
fn drain_cursor_values(
    cursor: &mut SortedStreamCursor,
    map: &mut KeyedSpillMap,
    key: &Tuple,
) -> Result<u64> {
    let Some(first) = cursor.next_value()? else {
        return Ok(0);
    };
    let store = map.get_or_create(key)?;
    store.add(first)?;
    let mut delivered = 1u64;
    while let Some(value) = cursor.next_value()? {
        store.add(value)?;
        delivered += 1;
    }
    Ok(delivered)
}

/// Wrap `source` with the in-flight key, the last key that completed,
/// and the per-ordinal spill counts.
fn aggregate_context(
    key: &Tuple,
    last_emitted: Option<&Tuple>,
    maps: &[KeyedSpillMap],
    source: Error,
) -> Error {
    let last = match last_emitted {
        Some(key) => key.to_string(),
        None => "(none)".to_string(),
    };
    let spills: Vec<u64> = maps.iter().map(KeyedSpillMap::spill_count).collect();
    Error::aggregate(key.to_string(), last, format!("{spills:?}"), source)
}
