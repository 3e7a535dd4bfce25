//! Sorted key/value input streams.

use riffle_result::Result;
use riffle_types::Tuple;

/// One sorted input of a merge.
///
/// Keys come back strictly ascending under the grouping comparator;
/// values hang off the most recent key. Object safe, so the engine can
/// hold `Box<dyn SortedStream>` per ordinal and mix source kinds freely.
///
/// Contract: `advance` discards any undrained values of the previous
/// key, and `next_value` keeps returning `None` once the current group
/// is drained, until the next `advance`. Implementations yield owned
/// tuples; callers may retain them after the implementation reuses or
/// rewrites its internal buffers.
pub trait SortedStream {
    /// Move to the next key; `None` once the input is exhausted.
    fn advance(&mut self) -> Result<Option<Tuple>>;

    /// Next value under the current key; `None` when the group is
    /// drained or no `advance` has happened yet.
    fn next_value(&mut self) -> Result<Option<Tuple>>;
}

/// In-memory sorted input for tests, demos, and benches.
///
/// Holds pre-grouped `(key, values)` runs and trusts the caller on
/// ordering; pair it with the engine's ordering checks when in doubt.
pub struct MemSortedStream {
    runs: std::vec::IntoIter<(Tuple, Vec<Tuple>)>,
    current: std::vec::IntoIter<Tuple>,
}

impl MemSortedStream {
    pub fn new(runs: Vec<(Tuple, Vec<Tuple>)>) -> Self {
        Self {
            runs: runs.into_iter(),
            current: Vec::new().into_iter(),
        }
    }
}

impl SortedStream for MemSortedStream {
    fn advance(&mut self) -> Result<Option<Tuple>> {
        match self.runs.next() {
            Some((key, values)) => {
                self.current = values.into_iter();
                Ok(Some(key))
            }
            None => {
                self.current = Vec::new().into_iter();
                Ok(None)
            }
        }
    }

    fn next_value(&mut self) -> Result<Option<Tuple>> {
        Ok(self.current.next())
    }
}
