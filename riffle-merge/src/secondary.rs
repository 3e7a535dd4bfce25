//! Secondary sort over composite keys.
//!
//! An input sorted by `(group fields…, sort fields…)` can serve a merge
//! that groups only by the leading fields: the adapter presents the
//! group prefix as the key and splices consecutive physical groups with
//! an equal prefix into one logical group, so values arrive in sort-key
//! order without the engine buffering anything for a sort.

use std::cmp::Ordering;

use riffle_result::{Error, Result};
use riffle_types::{KeyComparator, NaturalKeyOrder, Tuple};

use crate::stream::SortedStream;

/// [`SortedStream`] decorator exposing the first `group_width` fields of
/// an inner stream's composite keys as the grouping key.
///
/// The exposed key is copied out of the composite at group start, so a
/// caller can hold it across any number of later reads. Prefixes are
/// compared with the group comparator, which must agree with the order
/// the inner stream is sorted in.
pub struct SecondarySortAdapter<S: SortedStream, C: KeyComparator = NaturalKeyOrder> {
    inner: S,
    comparator: C,
    group_width: usize,
    /// First composite key of the next logical group, read but not served.
    stash: Option<Tuple>,
    current_group: Option<Tuple>,
    inner_exhausted: bool,
}

impl<S: SortedStream> SecondarySortAdapter<S, NaturalKeyOrder> {
    /// Adapter grouping by the natural order of the key prefix.
    pub fn new(inner: S, group_width: usize) -> Self {
        Self::with_comparator(inner, group_width, NaturalKeyOrder)
    }
}

impl<S: SortedStream, C: KeyComparator> SecondarySortAdapter<S, C> {
    pub fn with_comparator(inner: S, group_width: usize, comparator: C) -> Self {
        Self {
            inner,
            comparator,
            group_width,
            stash: None,
            current_group: None,
            inner_exhausted: false,
        }
    }

    fn check_width(&self, key: &Tuple) -> Result<()> {
        if self.group_width == 0 {
            return Err(Error::InvalidArgumentError(
                "group_width must be > 0".to_string(),
            ));
        }
        if key.len() < self.group_width {
            return Err(Error::InvalidArgumentError(format!(
                "composite key {key} has arity {}, group_width is {}",
                key.len(),
                self.group_width
            )));
        }
        Ok(())
    }
}

impl<S: SortedStream, C: KeyComparator> SortedStream for SecondarySortAdapter<S, C> {
    fn advance(&mut self) -> Result<Option<Tuple>> {
        // Whatever remains of the current logical group is skipped; this
        // also parks the first key of the next group in the stash.
        while self.next_value()?.is_some() {}

        if self.stash.is_none() && !self.inner_exhausted {
            match self.inner.advance()? {
                Some(key) => self.stash = Some(key),
                None => self.inner_exhausted = true,
            }
        }
        match self.stash.take() {
            Some(key) => {
                self.check_width(&key)?;
                let group = key.prefix(self.group_width);
                self.current_group = Some(group.clone());
                Ok(Some(group))
            }
            None => {
                self.current_group = None;
                Ok(None)
            }
        }
    }

    fn next_value(&mut self) -> Result<Option<Tuple>> {
        if self.current_group.is_none() {
            return Ok(None);
        }
        loop {
            // Once the next group's key is stashed (or the inner stream
            // ended), the inner stream is positioned past this logical
            // group; pulling from it here would serve the next group's
            // values under the current key.
            if self.stash.is_some() || self.inner_exhausted {
                return Ok(None);
            }
            if let Some(value) = self.inner.next_value()? {
                return Ok(Some(value));
            }
            match self.inner.advance()? {
                Some(next_key) => {
                    self.check_width(&next_key)?;
                    let prefix = next_key.prefix(self.group_width);
                    let same = match &self.current_group {
                        Some(group) => {
                            self.comparator.compare(&prefix, group) == Ordering::Equal
                        }
                        None => false,
                    };
                    if same {
                        continue;
                    }
                    self.stash = Some(next_key);
                    return Ok(None);
                }
                None => {
                    self.inner_exhausted = true;
                    return Ok(None);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use riffle_types::tuple;

    use crate::stream::MemSortedStream;

    #[test]
    fn merges_physical_groups_sharing_a_prefix() {
        let inner = MemSortedStream::new(vec![
            (tuple![1, "a"], vec![tuple![1, "a", 0]]),
            (tuple![1, "b"], vec![tuple![1, "b", 0], tuple![1, "b", 1]]),
            (tuple![2, "a"], vec![tuple![2, "a", 0]]),
        ]);
        let mut adapter = SecondarySortAdapter::new(inner, 1);

        assert_eq!(adapter.advance().unwrap(), Some(tuple![1]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![1, "a", 0]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![1, "b", 0]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![1, "b", 1]));
        assert_eq!(adapter.next_value().unwrap(), None);
        assert_eq!(adapter.next_value().unwrap(), None);

        assert_eq!(adapter.advance().unwrap(), Some(tuple![2]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![2, "a", 0]));
        assert_eq!(adapter.next_value().unwrap(), None);
        assert_eq!(adapter.advance().unwrap(), None);
        assert_eq!(adapter.next_value().unwrap(), None);
    }

    #[test]
    fn boundary_polls_leave_the_next_group_intact() {
        let inner = MemSortedStream::new(vec![
            (tuple![1, "a"], vec![tuple![1, "a", 0]]),
            (tuple![2, "a"], vec![tuple![2, "a", 0], tuple![2, "a", 1]]),
            (tuple![2, "b"], vec![tuple![2, "b", 0]]),
        ]);
        let mut adapter = SecondarySortAdapter::new(inner, 1);

        assert_eq!(adapter.advance().unwrap(), Some(tuple![1]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![1, "a", 0]));
        // Drained; extra polls park on the stashed key without reading
        // past it.
        for _ in 0..3 {
            assert_eq!(adapter.next_value().unwrap(), None);
        }

        assert_eq!(adapter.advance().unwrap(), Some(tuple![2]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![2, "a", 0]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![2, "a", 1]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![2, "b", 0]));
        assert_eq!(adapter.next_value().unwrap(), None);
    }

    #[test]
    fn advance_discards_the_rest_of_the_logical_group() {
        let inner = MemSortedStream::new(vec![
            (tuple![1, "a"], vec![tuple![1, "a", 0]]),
            (tuple![1, "b"], vec![tuple![1, "b", 0]]),
            (tuple![2, "a"], vec![tuple![2, "a", 0]]),
        ]);
        let mut adapter = SecondarySortAdapter::new(inner, 1);

        assert_eq!(adapter.advance().unwrap(), Some(tuple![1]));
        assert_eq!(adapter.advance().unwrap(), Some(tuple![2]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![2, "a", 0]));
    }

    #[test]
    fn wider_prefix_keeps_sort_fields_in_the_key() {
        let inner = MemSortedStream::new(vec![
            (tuple![1, "a", 10], vec![tuple![0]]),
            (tuple![1, "a", 11], vec![tuple![1]]),
            (tuple![1, "b", 10], vec![tuple![2]]),
        ]);
        let mut adapter = SecondarySortAdapter::new(inner, 2);

        assert_eq!(adapter.advance().unwrap(), Some(tuple![1, "a"]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![0]));
        assert_eq!(adapter.next_value().unwrap(), Some(tuple![1]));
        assert_eq!(adapter.next_value().unwrap(), None);
        assert_eq!(adapter.advance().unwrap(), Some(tuple![1, "b"]));
    }

    #[test]
    fn returned_group_key_is_detached_from_reader_state() {
        let inner = MemSortedStream::new(vec![
            (tuple![7, "a"], vec![tuple![7, "a", 0]]),
            (tuple![7, "b"], vec![tuple![7, "b", 0]]),
            (tuple![8, "a"], vec![]),
        ]);
        let mut adapter = SecondarySortAdapter::new(inner, 1);

        let held = adapter.advance().unwrap().unwrap();
        while adapter.next_value().unwrap().is_some() {}
        assert_eq!(adapter.advance().unwrap(), Some(tuple![8]));
        assert_eq!(held, tuple![7]);
    }

    #[test]
    fn zero_group_width_is_rejected_at_first_use() {
        let inner = MemSortedStream::new(vec![(tuple![1, "a"], vec![])]);
        let mut adapter = SecondarySortAdapter::new(inner, 0);
        assert!(matches!(
            adapter.advance(),
            Err(Error::InvalidArgumentError(_))
        ));
    }

    #[test]
    fn short_composite_key_is_rejected() {
        let inner = MemSortedStream::new(vec![(tuple![1], vec![])]);
        let mut adapter = SecondarySortAdapter::new(inner, 2);
        let err = adapter.advance().unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentError(_)));
    }
}
