//! On-disk spill segments.
//!
//! A segment holds one spilled buffer: written once, replayed at most once
//! per consuming iterator, deleted when its handle drops. Layout:
//!
//! ```text
//! bytes 0..=3   : MAGIC = b"RSG0"
//! byte  4       : format version (currently 1)
//! byte  5       : compression code (see `SpillCompression`)
//! bytes 6..=7   : reserved (currently 0)
//! bytes 8..=15  : item count (u64, little-endian)
//! bytes 16..    : frame stream, compressed as a whole per byte 5
//! frame         : [payload len (u32 LE)][payload = one encoded tuple]
//! ```
//!
//! The header stays uncompressed so a reader can pick the right decoder
//! from the file alone. Item count is known up front because a spill
//! always flushes a complete buffer, which keeps the header write
//! single-pass with no seek-back patching.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use riffle_result::{Error, Result};
use riffle_types::{Tuple, TupleCodec};
use tempfile::TempPath;

use crate::config::SpillCompression;
use crate::scratch::ScratchFiles;

const MAGIC: [u8; 4] = *b"RSG0";
const FORMAT_VERSION: u8 = 1;
const HEADER_LEN: usize = 16;

/// Handle to one written segment.
///
/// Owns the scratch file; the file is unlinked best-effort when the
/// handle drops.
#[derive(Debug)]
pub struct SpillSegment {
    path: TempPath,
    items: u64,
}

impl SpillSegment {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of values the segment holds.
    pub fn items(&self) -> u64 {
        self.items
    }
}

/// Serialize `values` in order into a fresh scratch segment.
pub fn write_segment(
    scratch: &dyn ScratchFiles,
    hint: &str,
    compression: SpillCompression,
    codec: &dyn TupleCodec,
    values: &[Tuple],
) -> Result<SpillSegment> {
    let (mut file, path) = scratch.create_segment_file(hint)?.into_parts();

    let mut header = [0u8; HEADER_LEN];
    header[0..4].copy_from_slice(&MAGIC);
    header[4] = FORMAT_VERSION;
    header[5] = compression.code();
    header[8..16].copy_from_slice(&(values.len() as u64).to_le_bytes());
    file.write_all(&header)
        .map_err(|e| Error::spill_io(path.to_path_buf(), "write segment header", e))?;

    let mut sink = Sink::new(file, compression);
    let mut frame = Vec::new();
    for (i, value) in values.iter().enumerate() {
        frame.clear();
        codec
            .write(&mut frame, value)
            .map_err(|e| e.with_items_processed(i as u64))?;
        let len = u32::try_from(frame.len()).map_err(|_| {
            Error::codec(i as u64, "encoded tuple exceeds the 4 GiB frame limit")
        })?;
        sink.write_all(&len.to_le_bytes())
            .map_err(|e| Error::spill_io(path.to_path_buf(), "write value frame", e))?;
        sink.write_all(&frame)
            .map_err(|e| Error::spill_io(path.to_path_buf(), "write value frame", e))?;
    }

    let mut out = sink
        .finish()
        .map_err(|e| Error::spill_io(path.to_path_buf(), "finish segment", e))?;
    out.flush()
        .map_err(|e| Error::spill_io(path.to_path_buf(), "flush segment", e))?;

    Ok(SpillSegment {
        path,
        items: values.len() as u64,
    })
}

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Zlib(ZlibEncoder<BufWriter<File>>),
}

impl Sink {
    fn new(file: File, compression: SpillCompression) -> Self {
        let buffered = BufWriter::new(file);
        match compression {
            SpillCompression::None => Sink::Plain(buffered),
            SpillCompression::Gzip => {
                Sink::Gzip(GzEncoder::new(buffered, Compression::default()))
            }
            SpillCompression::Zlib => {
                Sink::Zlib(ZlibEncoder::new(buffered, Compression::default()))
            }
        }
    }

    fn finish(self) -> io::Result<BufWriter<File>> {
        match self {
            Sink::Plain(w) => Ok(w),
            Sink::Gzip(w) => w.finish(),
            Sink::Zlib(w) => w.finish(),
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
            Sink::Zlib(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
            Sink::Zlib(w) => w.flush(),
        }
    }
}

/// Sequential reader over one segment's frames.
pub struct SegmentReader<'a> {
    codec: &'a dyn TupleCodec,
    source: Source,
    path: PathBuf,
    items_total: u64,
    items_read: u64,
    frame: Vec<u8>,
}

impl<'a> SegmentReader<'a> {
    /// Open `segment` for one front-to-back replay.
    pub fn open(segment: &SpillSegment, codec: &'a dyn TupleCodec) -> Result<Self> {
        let path = segment.path().to_path_buf();
        let mut file = File::open(&path)
            .map_err(|e| Error::spill_io(path.clone(), "open segment", e))?;

        let mut header = [0u8; HEADER_LEN];
        file.read_exact(&mut header)
            .map_err(|e| Error::spill_io(path.clone(), "read segment header", e))?;
        if header[0..4] != MAGIC {
            return Err(Error::codec(
                0,
                format!("segment {} has a bad magic number", path.display()),
            ));
        }
        if header[4] != FORMAT_VERSION {
            return Err(Error::codec(
                0,
                format!(
                    "segment {} has unsupported format version {}",
                    path.display(),
                    header[4]
                ),
            ));
        }
        let compression = SpillCompression::from_code(header[5]).ok_or_else(|| {
            Error::codec(
                0,
                format!(
                    "segment {} has unknown compression code {}",
                    path.display(),
                    header[5]
                ),
            )
        })?;
        let mut count = [0u8; 8];
        count.copy_from_slice(&header[8..16]);
        let items_total = u64::from_le_bytes(count);

        let buffered = BufReader::new(file);
        let source = match compression {
            SpillCompression::None => Source::Plain(buffered),
            SpillCompression::Gzip => Source::Gzip(GzDecoder::new(buffered)),
            SpillCompression::Zlib => Source::Zlib(ZlibDecoder::new(buffered)),
        };
        Ok(Self {
            codec,
            source,
            path,
            items_total,
            items_read: 0,
            frame: Vec::new(),
        })
    }

    /// Next value, or `None` once the header's item count is exhausted.
    ///
    /// Codec errors carry the number of values already read back
    /// successfully from this segment.
    pub fn next_tuple(&mut self) -> Result<Option<Tuple>> {
        if self.items_read == self.items_total {
            return Ok(None);
        }

        let mut len_bytes = [0u8; 4];
        read_classified(&mut self.source, &self.path, self.items_read, &mut len_bytes)?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        self.frame.clear();
        self.frame.try_reserve(len)?;
        self.frame.resize(len, 0);
        read_classified(&mut self.source, &self.path, self.items_read, &mut self.frame)?;

        let mut payload = self.frame.as_slice();
        let tuple = self
            .codec
            .read(&mut payload)
            .map_err(|e| e.with_items_processed(self.items_read))?;
        if !payload.is_empty() {
            return Err(Error::codec(
                self.items_read,
                format!("frame carries {} trailing bytes", payload.len()),
            ));
        }

        self.items_read += 1;
        Ok(Some(tuple))
    }
}

enum Source {
    Plain(BufReader<File>),
    Gzip(GzDecoder<BufReader<File>>),
    Zlib(ZlibDecoder<BufReader<File>>),
}

impl Read for Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Plain(r) => r.read(buf),
            Source::Gzip(r) => r.read(buf),
            Source::Zlib(r) => r.read(buf),
        }
    }
}

// Truncation and corrupt compressed data are data errors tied to the
// segment's content; anything else is a real I/O failure.
fn read_classified(
    source: &mut Source,
    path: &Path,
    items_read: u64,
    buf: &mut [u8],
) -> Result<()> {
    match source.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e)
            if e.kind() == io::ErrorKind::UnexpectedEof
                || e.kind() == io::ErrorKind::InvalidData =>
        {
            Err(Error::codec(
                items_read,
                format!("segment {}: {e}", path.display()),
            ))
        }
        Err(e) => Err(Error::spill_io(path, "read value frame", e)),
    }
}
