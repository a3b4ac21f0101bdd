//! Output types returned by the entry points in [`crate::print`].
//!
//! [`BatchOutput`] and [`PreviewOutput`] hold local paths; the `*Response`
//! types are the client-facing JSON shapes with paths turned into URLs
//! under the configured public base URL.

use crate::error::JobError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// URL path segment for merged and component PDFs.
pub const PDF_ROUTE: &str = "pdfs";
/// URL path segment for preview images.
pub const PREVIEW_ROUTE: &str = "preview";
/// URL path segment for screenshots.
pub const PNG_ROUTE: &str = "pngs";

/// Counters and timings for one batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    /// Sources submitted.
    pub total_jobs: usize,
    /// Sources that rendered and were persisted.
    pub rendered_jobs: usize,
    /// Sources left out of the merged document.
    pub failed_jobs: usize,
    /// Wall-clock time of the fan-out/fan-in phase.
    pub render_duration_ms: u64,
    /// Wall-clock time of the merge tool.
    pub merge_duration_ms: u64,
    /// Whole request.
    pub total_duration_ms: u64,
}

/// The result of a batch print.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// The merged document.
    pub combined: PathBuf,
    /// Persisted per-source PDFs in submission order, failures omitted.
    pub components: Vec<PathBuf>,
    /// Why each omitted source failed, ordered by index.
    pub failures: Vec<JobError>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// Submission indices that were omitted from the merged document.
    pub fn failed_indices(&self) -> Vec<usize> {
        self.failures.iter().map(JobError::index).collect()
    }
}

/// The result of a preview request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewOutput {
    pub batch: BatchOutput,
    /// Page count reported by the info tool.
    pub pages: usize,
    /// One image per page, page 1 first.
    pub images: Vec<PathBuf>,
}

/// Client-facing response for a batch print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfResponse {
    pub url: String,
    pub components: Vec<String>,
    /// Present only when failure reporting is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<usize>>,
}

/// Client-facing response for a preview request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub pages: usize,
    pub images: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<usize>>,
}

/// Client-facing response for a screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotResponse {
    pub url: String,
}

/// `<base>/<route>/<file name of path>`.
pub fn public_url(base_url: &str, route: &str, path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}/{}/{}", base_url.trim_end_matches('/'), route, name)
}

impl PdfResponse {
    pub fn from_output(output: &BatchOutput, base_url: &str, report_failures: bool) -> Self {
        Self {
            url: public_url(base_url, PDF_ROUTE, &output.combined),
            components: output
                .components
                .iter()
                .map(|p| public_url(base_url, PDF_ROUTE, p))
                .collect(),
            failed: report_failures.then(|| output.failed_indices()),
        }
    }
}

impl PreviewResponse {
    pub fn from_output(output: &PreviewOutput, base_url: &str, report_failures: bool) -> Self {
        Self {
            pages: output.pages,
            images: output
                .images
                .iter()
                .map(|p| public_url(base_url, PREVIEW_ROUTE, p))
                .collect(),
            failed: report_failures.then(|| output.batch.failed_indices()),
        }
    }
}

impl ScreenshotResponse {
    pub fn from_path(path: &Path, base_url: &str) -> Self {
        Self {
            url: public_url(base_url, PNG_ROUTE, path),
        }
    }
}
