//! Artifact writer: persists rendered bytes under `<root>/files/<kind>/`.
//!
//! Every file gets a fresh random name from `tempfile` and is then kept, so
//! concurrent requests never collide. Component PDFs are prefixed with
//! their submission index (`7-k3Jd9a.pdf`) to make directory listings
//! readable. Any failure here is fatal to the request.

use crate::config::{PrinterConfig, PDF_DIR, PNG_DIR, PREVIEW_DIR, SOURCE_DIR};
use crate::error::PrinterError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Per-kind output directories rooted at `<root>/files`.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    files_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(config: &PrinterConfig) -> Self {
        Self::at(config.root_dir.join("files"))
    }

    /// Store rooted directly at `files_dir`.
    pub fn at(files_dir: impl Into<PathBuf>) -> Self {
        Self {
            files_dir: files_dir.into(),
        }
    }

    pub fn dir(&self, kind: &str) -> PathBuf {
        self.files_dir.join(kind)
    }

    /// Create every output directory up front.
    pub fn prepare(&self) -> Result<(), PrinterError> {
        for kind in [PDF_DIR, PREVIEW_DIR, PNG_DIR, SOURCE_DIR] {
            let dir = self.dir(kind);
            std::fs::create_dir_all(&dir).map_err(|e| PrinterError::Persist {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }

    /// Write one successful job's PDF.
    pub fn write_component(&self, index: usize, bytes: &[u8]) -> Result<PathBuf, PrinterError> {
        self.write_new(PDF_DIR, &format!("{index}-"), ".pdf", bytes)
    }

    /// Write a screenshot.
    pub fn write_png(&self, bytes: &[u8]) -> Result<PathBuf, PrinterError> {
        self.write_new(PNG_DIR, "", ".png", bytes)
    }

    /// Dump a request's raw sources as JSON for offline inspection.
    pub fn dump_sources(&self, sources: &[String]) -> Result<PathBuf, PrinterError> {
        let json = serde_json::to_vec_pretty(sources)
            .map_err(|e| PrinterError::Internal(format!("serialise sources: {e}")))?;
        self.write_new(SOURCE_DIR, "", ".json", &json)
    }

    /// Create an empty, uniquely named file for an external tool to fill.
    pub fn reserve(&self, kind: &str, suffix: &str) -> Result<PathBuf, PrinterError> {
        self.write_new(kind, "", suffix, &[])
    }

    fn write_new(
        &self,
        kind: &str,
        prefix: &str,
        suffix: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, PrinterError> {
        let dir = self.dir(kind);
        let persist_err = |path: &Path, e: std::io::Error| PrinterError::Persist {
            path: path.to_path_buf(),
            source: e,
        };

        std::fs::create_dir_all(&dir).map_err(|e| persist_err(&dir, e))?;

        let mut file = tempfile::Builder::new()
            .prefix(prefix)
            .suffix(suffix)
            .tempfile_in(&dir)
            .map_err(|e| persist_err(&dir, e))?;
        if let Err(e) = file.write_all(bytes).and_then(|_| file.flush()) {
            return Err(persist_err(file.path(), e));
        }

        let (_, path) = file.keep().map_err(|e| {
            let path = e.file.path().to_path_buf();
            persist_err(&path, e.error)
        })?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}
