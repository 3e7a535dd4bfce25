use std::collections::TryReserveError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all riffle operations.
///
/// Every failure mode of the merge-grouping pipeline lands in this enum,
/// from segment-file I/O up to callback failures wrapped with grouping
/// context. Variants carry the information the outer runner needs to emit
/// an actionable diagnostic without re-parsing message strings.
///
/// # Propagation
///
/// Errors travel up with `?` and surface exactly once, from
/// `MergeGroupEngine::run`. Nothing in this workspace retries internally;
/// side effects already delivered to the aggregation callback are not
/// rolled back.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O failure creating, writing, or reading a spill segment.
    ///
    /// Fatal and non-retried: space and permission problems are assumed to
    /// be checked once at temp-file creation, so a failure mid-stream means
    /// the partition is lost. Carries the segment path and a short phase
    /// description ("create", "write value", "read frame", ...).
    #[error("spill segment {}: {context}: {source}", path.display())]
    SpillIo {
        path: PathBuf,
        context: String,
        #[source]
        source: io::Error,
    },

    /// A value failed to encode or decode.
    ///
    /// `items_processed` is the number of values successfully handled on
    /// the same stream before the failure, which localises corruption
    /// inside a segment during post-mortem.
    #[error("value codec failed after {items_processed} values: {detail}")]
    Codec { items_processed: u64, detail: String },

    /// Memory exhaustion while buffering or aggregating.
    ///
    /// Specially flagged so the outer runner can suggest raising task
    /// memory or lowering the spill threshold instead of treating the
    /// failure as data corruption. Check with [`Error::is_out_of_memory`],
    /// which also sees through the [`Error::Aggregate`] wrapper.
    #[error("out of memory: {detail}")]
    OutOfMemory { detail: String },

    /// An input stream handed the engine a key that regressed under the
    /// grouping comparator.
    ///
    /// Only ever raised when the cheap ordering assertion is enabled;
    /// with the assertion off, unsorted input is undefined behavior by
    /// documented contract, not a runtime-enforced error.
    #[error("input ordinal {ordinal} violated ascending key order: {detail}")]
    OrderingViolation { ordinal: usize, detail: String },

    /// Context wrapper added by the merge engine around a failure that
    /// occurred while a key was being grouped or aggregated.
    ///
    /// The message always names the key being processed, the last key that
    /// completed successfully, and the per-ordinal spill counts, which is
    /// usually enough to tell memory pressure from bad data without logs.
    #[error(
        "group step failed at key {key} (last emitted: {last_emitted}; spills per ordinal: {ordinal_spills}): {source}"
    )]
    Aggregate {
        key: String,
        last_emitted: String,
        ordinal_spills: String,
        #[source]
        source: Box<Error>,
    },

    /// I/O error outside the spill path (scratch-directory setup and the
    /// like).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid user input or API parameter, e.g. a zero spill threshold or
    /// an engine built over zero sources.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal error indicating a bug or unexpected state. Should never
    /// occur during normal operation.
    #[error("An internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create a [`Error::SpillIo`] with path and phase context.
    pub fn spill_io(path: impl Into<PathBuf>, context: impl Into<String>, source: io::Error) -> Self {
        Error::SpillIo {
            path: path.into(),
            context: context.into(),
            source,
        }
    }

    /// Create a [`Error::Codec`] recording how many values were processed
    /// successfully before the failure.
    pub fn codec(items_processed: u64, detail: impl Into<String>) -> Self {
        Error::Codec {
            items_processed,
            detail: detail.into(),
        }
    }

    /// Stamp the running per-stream item count onto a [`Error::Codec`].
    ///
    /// The codec itself has no stream position, so it reports zero; the
    /// segment reader rewrites the count as the error passes through.
    /// Other variants are returned unchanged.
    pub fn with_items_processed(self, items_processed: u64) -> Self {
        match self {
            Error::Codec { detail, .. } => Error::Codec {
                items_processed,
                detail,
            },
            other => other,
        }
    }

    /// Wrap `source` with grouping context. Used by the merge engine only;
    /// nesting an already-wrapped error keeps the innermost cause visible
    /// through [`Error::is_out_of_memory`].
    pub fn aggregate(
        key: impl Into<String>,
        last_emitted: impl Into<String>,
        ordinal_spills: impl Into<String>,
        source: Error,
    ) -> Self {
        Error::Aggregate {
            key: key.into(),
            last_emitted: last_emitted.into(),
            ordinal_spills: ordinal_spills.into(),
            source: Box::new(source),
        }
    }

    /// True when this error is memory exhaustion, looking through any
    /// [`Error::Aggregate`] context layers.
    pub fn is_out_of_memory(&self) -> bool {
        match self {
            Error::OutOfMemory { .. } => true,
            Error::Aggregate { source, .. } => source.is_out_of_memory(),
            _ => false,
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(err: TryReserveError) -> Self {
        Error::OutOfMemory {
            detail: err.to_string(),
        }
    }
}
