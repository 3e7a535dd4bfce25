use riffle_result::{Error, Result};
use riffle_types::{KeyComparator, Tuple};

use crate::stream::SortedStream;

/// One input stream plus its lookahead state.
///
/// The engine never touches a [`SortedStream`] directly: the cursor
/// owns it, holds at most one fetched-but-unconsumed key (`pending`),
/// and remembers the last key it handed out so the optional ordering
/// assertion can catch a regressing input at the exact ordinal.
pub(crate) struct SortedStreamCursor {
    stream: Box<dyn SortedStream>,
    ordinal: usize,
    pending: Option<Tuple>,
    exhausted: bool,
    last_key: Option<Tuple>,
}

impl SortedStreamCursor {
    pub(crate) fn new(stream: Box<dyn SortedStream>, ordinal: usize) -> Self {
        Self {
            stream,
            ordinal,
            pending: None,
            exhausted: false,
            last_key: None,
        }
    }

    /// Pull the next key from the stream if no key is already pending.
    ///
    /// Returns `Ok(true)` when a fresh key was loaded, meaning its values
    /// are now waiting behind [`Self::next_value`]. Returns `Ok(false)`
    /// when a pending key is still unconsumed or the stream is done.
    pub(crate) fn fill<C: KeyComparator>(
        &mut self,
        comparator: &C,
        check_ordering: bool,
    ) -> Result<bool> {
        if self.pending.is_some() || self.exhausted {
            return Ok(false);
        }
        let Some(key) = self.stream.advance()? else {
            self.exhausted = true;
            return Ok(false);
        };
        if check_ordering {
            if let Some(last) = &self.last_key {
                if comparator.compare(last, &key) != std::cmp::Ordering::Less {
                    return Err(Error::OrderingViolation {
                        ordinal: self.ordinal,
                        detail: format!("key {key} follows {last}"),
                    });
                }
            }
            self.last_key = Some(key.clone());
        }
        self.pending = Some(key);
        Ok(true)
    }

    pub(crate) fn pending(&self) -> Option<&Tuple> {
        self.pending.as_ref()
    }

    pub(crate) fn take_pending(&mut self) -> Option<Tuple> {
        self.pending.take()
    }

    pub(crate) fn next_value(&mut self) -> Result<Option<Tuple>> {
        self.stream.next_value()
    }
}
