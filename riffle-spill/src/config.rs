//! Spill tuning knobs.

use std::fmt;

use riffle_result::{Error, Result};

/// Compression applied to segment payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpillCompression {
    None,
    Gzip,
    Zlib,
}

impl SpillCompression {
    /// Stable code stored in the segment header.
    pub(crate) fn code(self) -> u8 {
        match self {
            SpillCompression::None => 0,
            SpillCompression::Gzip => 1,
            SpillCompression::Zlib => 2,
        }
    }

    pub(crate) fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SpillCompression::None),
            1 => Some(SpillCompression::Gzip),
            2 => Some(SpillCompression::Zlib),
            _ => None,
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "none" => Some(SpillCompression::None),
            "gzip" => Some(SpillCompression::Gzip),
            "zlib" => Some(SpillCompression::Zlib),
            _ => None,
        }
    }
}

impl fmt::Display for SpillCompression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpillCompression::None => write!(f, "none"),
            SpillCompression::Gzip => write!(f, "gzip"),
            SpillCompression::Zlib => write!(f, "zlib"),
        }
    }
}

/// Options controlling when value buffers spill and how segments are
/// written.
#[derive(Clone, Debug)]
pub struct SpillConfig {
    /// Max values a single store buffers in memory before spilling.
    pub list_spill_threshold: usize,
    /// Total buffered-value budget shared by every key of one map. Drives
    /// the per-key threshold down as more keys appear.
    pub map_value_budget: usize,
    /// Whether segment payloads are compressed at all. `false` overrides
    /// any codec list.
    pub compress_spills: bool,
    /// Ordered codec preference; the first recognised name wins and
    /// unrecognised names are skipped with a warning. Recognised names:
    /// `gzip`, `zlib`, `none`.
    pub spill_codecs: Vec<String>,
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self {
            list_spill_threshold: 10_000,
            map_value_budget: 10_000,
            compress_spills: true,
            spill_codecs: vec!["gzip".to_string(), "zlib".to_string()],
        }
    }
}

impl SpillConfig {
    /// Set the per-store in-memory cap.
    pub fn with_list_spill_threshold(mut self, threshold: usize) -> Self {
        self.list_spill_threshold = threshold;
        self
    }

    /// Set the shared buffered-value budget.
    pub fn with_map_value_budget(mut self, budget: usize) -> Self {
        self.map_value_budget = budget;
        self
    }

    /// Enable or disable segment compression.
    pub fn with_compress_spills(mut self, compress: bool) -> Self {
        self.compress_spills = compress;
        self
    }

    /// Replace the codec preference list.
    pub fn with_spill_codecs(mut self, codecs: Vec<String>) -> Self {
        self.spill_codecs = codecs;
        self
    }

    /// Pick the segment compression this config asks for.
    ///
    /// Scans `spill_codecs` front to back and takes the first recognised
    /// name; an empty or fully unrecognised list falls back to
    /// uncompressed segments.
    pub fn resolve_compression(&self) -> SpillCompression {
        if !self.compress_spills {
            return SpillCompression::None;
        }
        for name in &self.spill_codecs {
            match SpillCompression::parse(name) {
                Some(compression) => return compression,
                None => {
                    tracing::warn!(codec = name.as_str(), "unknown spill codec, skipping");
                }
            }
        }
        SpillCompression::None
    }
}

/// Validate spill options before any store is built.
pub fn validate_spill_config(config: &SpillConfig) -> Result<()> {
    if config.list_spill_threshold == 0 {
        return Err(Error::InvalidArgumentError(
            "list_spill_threshold must be > 0".to_string(),
        ));
    }
    if config.map_value_budget == 0 {
        return Err(Error::InvalidArgumentError(
            "map_value_budget must be > 0".to_string(),
        ));
    }
    Ok(())
}
