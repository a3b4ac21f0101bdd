//! Error types for the remote-pdf-printer library.
//!
//! Three distinct error types reflect three distinct failure modes:
//!
//! * [`ValidationError`] — the request itself is malformed (no sources,
//!   header without a top margin, …). Raised before any backend session is
//!   opened or any file is written.
//!
//! * [`PrinterError`] — **Fatal**: the request cannot produce an output
//!   (artifact write failed, merge tool failed, screenshot came back
//!   empty). Returned as `Err(PrinterError)` from the entry points in
//!   [`crate::print`].
//!
//! * [`JobError`] — **Non-fatal**: one source of a batch failed to render
//!   but the others are fine. Stored inside
//!   [`crate::pipeline::dispatch::RenderResult`]; the failed index is left
//!   out of the merged document.

use std::path::PathBuf;
use thiserror::Error;

/// Request-level validation failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The request carried no sources at all.
    #[error("No sources supplied: at least one URL or markup document is required")]
    EmptySources,

    /// A header template was supplied without `marginTop`.
    #[error("marginTop is required when providing a header template")]
    HeaderWithoutTopMargin,

    /// A footer template was supplied without `marginBottom`.
    #[error("marginBottom is required when providing a footer template")]
    FooterWithoutBottomMargin,

    /// `paperSize` must be `[width, height]`.
    #[error("paperSize must contain exactly two values (width, height), got {len}")]
    PaperSize { len: usize },

    /// Element capture and explicit clip coordinates were both requested.
    #[error("Element capture (domId/xpath) cannot be combined with x/y/width/height/scale")]
    ConflictingCapture,

    /// Both `domId` and `xpath` were supplied.
    #[error("Supply either domId or xpath, not both")]
    AmbiguousSelector,

    /// A numeric field is negative, zero where it must be positive, or not finite.
    #[error("Invalid value for {field}: {value}")]
    InvalidNumber { field: &'static str, value: f64 },
}

/// All fatal errors returned by the remote-pdf-printer library.
///
/// Per-source failures use [`JobError`] and are stored in
/// [`crate::pipeline::dispatch::RenderResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum PrinterError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The request failed validation; nothing was dispatched.
    #[error("Invalid request: {0}")]
    Validation(#[from] ValidationError),

    // ── Batch errors ──────────────────────────────────────────────────────
    /// Every job of the batch failed, so there is nothing to merge.
    #[error("All {total} sources failed to render.\nFirst error: {first_error}")]
    NothingRendered { total: usize, first_error: String },

    /// A successfully rendered artifact could not be written to disk.
    #[error("Failed to write artifact '{path}': {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The merge tool failed to combine the component documents.
    #[error("Unable to combine component PDFs: {detail}")]
    Merge { detail: String },

    // ── Preview errors ────────────────────────────────────────────────────
    /// The info-extraction tool failed.
    #[error("Unable to get PDF information for '{path}': {detail}")]
    InfoExtraction { path: PathBuf, detail: String },

    /// The info output had no usable `pages` entry.
    #[error("Unable to compute number of pages (pages = {raw:?})")]
    PageCount { raw: Option<String> },

    /// The rasterizer failed or produced no recognisable page images.
    #[error("Unable to produce PDF image previews: {detail}")]
    Rasterize { detail: String },

    // ── Screenshot errors ─────────────────────────────────────────────────
    /// The single-shot capture failed in the backend.
    #[error("Screenshot capture failed: {detail}")]
    Capture { detail: String },

    /// The backend returned a zero-byte image.
    #[error("No image returned")]
    NoImageReturned,

    // ── Backend errors ────────────────────────────────────────────────────
    /// The rendering backend could not be reached or queried.
    #[error("Rendering backend error: {0}")]
    Backend(String),

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single job of a batch.
///
/// The batch continues; the job's index is omitted from the merged output.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum JobError {
    /// The backend rejected the navigation or the print call.
    #[error("Source {index}: render failed: {detail}")]
    RenderFailed { index: usize, detail: String },

    /// The backend reported success but returned no bytes.
    #[error("Source {index}: backend returned an empty document")]
    EmptyPayload { index: usize },

    /// The job exceeded its own deadline.
    #[error("Source {index}: render timed out after {secs}s")]
    Timeout { index: usize, secs: u64 },

    /// The job was still pending when the whole batch ran out of time.
    #[error("Source {index}: abandoned when the batch deadline of {secs}s elapsed")]
    BatchDeadline { index: usize, secs: u64 },

    /// The blocking render task panicked.
    #[error("Source {index}: render task panicked: {detail}")]
    Panicked { index: usize, detail: String },
}

impl JobError {
    /// Submission index of the job this error belongs to.
    pub fn index(&self) -> usize {
        match self {
            JobError::RenderFailed { index, .. }
            | JobError::EmptyPayload { index }
            | JobError::Timeout { index, .. }
            | JobError::BatchDeadline { index, .. }
            | JobError::Panicked { index, .. } => *index,
        }
    }
}
