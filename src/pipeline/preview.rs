//! Preview generator: page count from the info tool, one JPEG per page
//! from the rasterizer.
//!
//! The rasterizer writes `<prefix>-<n>.jpg`, and whether `<n>` is
//! zero-padded to the width of the page count depends on the poppler
//! version installed. Rather than guess, [`PageNaming::detect`] looks at
//! what actually landed on disk.

use crate::config::{PrinterConfig, PREVIEW_DIR};
use crate::error::PrinterError;
use crate::pipeline::artifacts::ArtifactStore;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Parse `Key: value` lines into a normalised map.
///
/// Keys are lower-cased with spaces turned into underscores; values are
/// trimmed. Only the first colon separates key from value, so values such
/// as timestamps keep theirs. Lines without a colon are skipped.
pub fn parse_info(text: &str) -> HashMap<String, String> {
    text.lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| {
            (
                key.trim().to_lowercase().replace(' ', "_"),
                value.trim().to_string(),
            )
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// The `pages` entry as a count.
pub fn page_count(info: &HashMap<String, String>) -> Result<usize, PrinterError> {
    let raw = info.get("pages");
    raw.and_then(|v| v.parse::<usize>().ok())
        .ok_or_else(|| PrinterError::PageCount { raw: raw.cloned() })
}

/// Number of decimal digits in `n` (at least 1).
pub fn digits(n: usize) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// How the rasterizer numbered its output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNaming {
    /// `<base>-1.jpg … <base>-12.jpg`
    Plain,
    /// `<base>-01.jpg … <base>-12.jpg`, padded to this width.
    Padded(usize),
}

impl PageNaming {
    /// Inspect `dir` for the first page image of a `pages`-page document.
    ///
    /// Returns `None` when neither convention's first page exists.
    pub fn detect(dir: &Path, base: &str, pages: usize) -> Option<Self> {
        let width = digits(pages);
        let padded = PageNaming::Padded(width);
        if dir.join(padded.file_name(base, 1)).is_file() {
            return Some(if width > 1 { padded } else { PageNaming::Plain });
        }
        let plain = PageNaming::Plain;
        dir.join(plain.file_name(base, 1)).is_file().then_some(plain)
    }

    pub fn file_name(&self, base: &str, page: usize) -> String {
        match *self {
            PageNaming::Plain => format!("{base}-{page}.jpg"),
            PageNaming::Padded(width) => format!("{base}-{page:0width$}.jpg"),
        }
    }
}

/// Rasterise `combined` into the preview directory.
///
/// Returns the page count and one image path per page, page 1 first.
pub async fn generate_previews(
    combined: &Path,
    store: &ArtifactStore,
    config: &PrinterConfig,
) -> Result<(usize, Vec<PathBuf>), PrinterError> {
    let timeout = Duration::from_secs(config.tool_timeout_secs);

    let text = config
        .tools
        .info(combined, timeout)
        .await
        .map_err(|e| PrinterError::InfoExtraction {
            path: combined.to_path_buf(),
            detail: e.to_string(),
        })?;
    let pages = page_count(&parse_info(&text))?;
    debug!("{} reports {} pages", combined.display(), pages);

    let base = combined
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| PrinterError::Internal(format!("no file name in {}", combined.display())))?;
    let dir = store.dir(PREVIEW_DIR);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| PrinterError::Persist {
            path: dir.clone(),
            source: e,
        })?;

    config
        .tools
        .rasterize(combined, &dir.join(&base), config.preview_scale, timeout)
        .await
        .map_err(|e| PrinterError::Rasterize {
            detail: e.to_string(),
        })?;

    if pages == 0 {
        return Ok((0, Vec::new()));
    }

    let naming = PageNaming::detect(&dir, &base, pages).ok_or_else(|| PrinterError::Rasterize {
        detail: format!("no page images named '{base}-*.jpg' in {}", dir.display()),
    })?;

    let images: Vec<PathBuf> = (1..=pages)
        .map(|page| dir.join(naming.file_name(&base, page)))
        .collect();
    if let Some(missing) = images.iter().find(|p| !p.is_file()) {
        return Err(PrinterError::Rasterize {
            detail: format!("expected page image {} was not produced", missing.display()),
        });
    }

    info!("Generated {} preview images ({:?})", pages, naming);
    Ok((pages, images))
}
