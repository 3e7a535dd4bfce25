//! The bounded value buffer behind one group key.

use std::borrow::Cow;
use std::sync::Arc;

use riffle_result::{Error, Result};
use riffle_types::{Tuple, TupleCodec};

use crate::config::SpillCompression;
use crate::scratch::ScratchFiles;
use crate::segment::{self, SegmentReader, SpillSegment};

/// Append-only value collection that keeps at most `threshold` values in
/// memory and flushes full buffers to scratch segments.
///
/// `add` checks the threshold before appending, never after, so the
/// buffer is empty immediately after every spill and its peak size is
/// exactly the threshold. [`SpillStore::iter`] replays all values in
/// arrival order regardless of how they are split between segments and
/// the live buffer.
///
/// Not internally synchronized; one producer and one consumer at a time.
pub struct SpillStore {
    threshold: usize,
    compression: SpillCompression,
    codec: Arc<dyn TupleCodec>,
    scratch: Arc<dyn ScratchFiles>,
    hint: String,
    buffer: Vec<Tuple>,
    segments: Vec<SpillSegment>,
}

impl SpillStore {
    /// `threshold` must be at least 1 so a spill can never produce an
    /// empty segment.
    pub fn new(
        threshold: usize,
        compression: SpillCompression,
        codec: Arc<dyn TupleCodec>,
        scratch: Arc<dyn ScratchFiles>,
    ) -> Result<Self> {
        if threshold == 0 {
            return Err(Error::InvalidArgumentError(
                "spill threshold must be > 0".to_string(),
            ));
        }
        Ok(Self {
            threshold,
            compression,
            codec,
            scratch,
            hint: "spill".to_string(),
            buffer: Vec::new(),
            segments: Vec::new(),
        })
    }

    /// Tag this store's scratch files and log lines.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = hint.into();
        self
    }

    /// Append one value, spilling the buffer first if it is full.
    pub fn add(&mut self, value: Tuple) -> Result<()> {
        if self.buffer.len() >= self.threshold {
            self.spill()?;
        }
        self.buffer.try_reserve(1)?;
        self.buffer.push(value);
        Ok(())
    }

    /// Flush the buffer to a new segment. No-op on an empty buffer.
    pub fn spill(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let segment = segment::write_segment(
            self.scratch.as_ref(),
            &self.hint,
            self.compression,
            self.codec.as_ref(),
            &self.buffer,
        )?;
        tracing::debug!(
            items = segment.items(),
            segment = self.segments.len(),
            path = %segment.path().display(),
            "spilled value buffer"
        );
        self.segments.push(segment);
        self.buffer.clear();
        Ok(())
    }

    /// Replay every value in arrival order: segments oldest-first, then
    /// the in-memory tail.
    ///
    /// Values still in the buffer come back borrowed; spilled values are
    /// decoded into owned tuples. At most one segment file is open at a
    /// time.
    pub fn iter(&self) -> StoreIter<'_> {
        StoreIter {
            store: self,
            next_segment: 0,
            reader: None,
            buffer_pos: 0,
            done: false,
        }
    }

    /// Total values held across segments and the buffer.
    pub fn len(&self) -> usize {
        let spilled: u64 = self.segments.iter().map(SpillSegment::items).sum();
        spilled as usize + self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values currently resident in memory.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Segments written since creation or the last [`SpillStore::clear`].
    pub fn spill_count(&self) -> u64 {
        self.segments.len() as u64
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Drop buffered values and release segment files. Idempotent; the
    /// store is reusable afterwards.
    pub fn clear(&mut self) {
        self.buffer.clear();
        // TempPath drops unlink the files best-effort.
        self.segments.clear();
    }

    /// Teardown alias for scan shutdown and error paths; also returns the
    /// buffer's allocation.
    pub fn close(&mut self) {
        self.clear();
        self.buffer.shrink_to_fit();
    }
}

/// Consume-once replay over a store's values. See [`SpillStore::iter`].
pub struct StoreIter<'a> {
    store: &'a SpillStore,
    next_segment: usize,
    reader: Option<SegmentReader<'a>>,
    buffer_pos: usize,
    done: bool,
}

impl<'a> Iterator for StoreIter<'a> {
    type Item = Result<Cow<'a, Tuple>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(reader) = self.reader.as_mut() {
                match reader.next_tuple() {
                    Ok(Some(tuple)) => return Some(Ok(Cow::Owned(tuple))),
                    Ok(None) => {
                        // Close this segment's handle before opening the next.
                        self.reader = None;
                    }
                    Err(e) => {
                        self.done = true;
                        self.reader = None;
                        return Some(Err(e));
                    }
                }
                continue;
            }
            if self.next_segment < self.store.segments.len() {
                let segment = &self.store.segments[self.next_segment];
                self.next_segment += 1;
                match SegmentReader::open(segment, self.store.codec.as_ref()) {
                    Ok(reader) => self.reader = Some(reader),
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e));
                    }
                }
                continue;
            }
            if self.buffer_pos < self.store.buffer.len() {
                let tuple = &self.store.buffer[self.buffer_pos];
                self.buffer_pos += 1;
                return Some(Ok(Cow::Borrowed(tuple)));
            }
            self.done = true;
            return None;
        }
    }
}
