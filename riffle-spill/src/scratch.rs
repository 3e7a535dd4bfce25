//! Scratch-file provisioning for spill segments.

use std::path::PathBuf;

use riffle_result::{Error, Result};
use tempfile::NamedTempFile;

/// Source of uniquely named scratch files.
///
/// Files are writable on return and deleted best-effort once the last
/// handle to them drops. Object safe so stores can share one provider
/// behind `Arc<dyn ScratchFiles>`; a test double can redirect segments or
/// inject creation failures.
pub trait ScratchFiles: Send + Sync {
    /// Create a fresh segment file. `hint` seeds the file name so stray
    /// segments in the scratch directory can be traced back to a store.
    fn create_segment_file(&self, hint: &str) -> Result<NamedTempFile>;
}

/// Scratch files in the OS temp dir, or in a caller-picked directory.
#[derive(Debug, Clone, Default)]
pub struct TempScratch {
    dir: Option<PathBuf>,
}

impl TempScratch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place segments under `dir` instead of the process temp dir.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }
}

impl ScratchFiles for TempScratch {
    fn create_segment_file(&self, hint: &str) -> Result<NamedTempFile> {
        let prefix = format!("{hint}-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(".spill");
        let created = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        };
        created.map_err(|e| {
            let dir = self.dir.clone().unwrap_or_else(std::env::temp_dir);
            Error::spill_io(dir, "create segment file", e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn segment_files_land_in_the_requested_dir() {
        let dir = tempfile::tempdir().unwrap();
        let scratch = TempScratch::in_dir(dir.path());
        let mut file = scratch.create_segment_file("unit").unwrap();
        file.write_all(b"x").unwrap();

        assert_eq!(file.path().parent(), Some(dir.path()));
        let name = file.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("unit-"), "got {name}");
        assert!(name.ends_with(".spill"), "got {name}");
    }

    #[test]
    fn create_failure_reports_the_scratch_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let scratch = TempScratch::in_dir(&missing);
        let err = scratch.create_segment_file("unit").unwrap_err();
        assert!(err.to_string().contains("nope"), "got {err}");
    }
}
