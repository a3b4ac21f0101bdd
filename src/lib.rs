//! # remote-pdf-printer
//!
//! Print batches of web pages and HTML documents to one merged PDF through
//! a remote headless Chrome, with optional page previews and single-shot
//! screenshots.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PdfRequest
//!  │
//!  ├─ 1. Validate  sources present, header ⇒ marginTop, footer ⇒ marginBottom
//!  ├─ 2. Classify  URL passes through, markup → data:text/html;base64
//!  ├─ 3. Render    one Chrome tab per source, at most max_sessions at once
//!  ├─ 4. Collect   index-addressed arena; failures dropped, order kept
//!  ├─ 5. Persist   files/pdfs/<index>-XXXX.pdf
//!  ├─ 6. Merge     pdfunite → files/pdfs/XXXX-combined.pdf
//!  └─ 7. Preview   pdfinfo page count + pdftocairo JPEG per page (optional)
//! ```
//!
//! A source that fails to render never fails the batch; it is left out of
//! the merged document. Set
//! [`PrinterConfigBuilder::report_failed_jobs`] to surface the failed
//! indices in responses.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use remote_pdf_printer::{print_pdf, PdfRequest, PrinterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PrinterConfig::builder()
//!         .chrome_uri("127.0.0.1:9222")
//!         .root_dir("/srv/remote-pdf")
//!         .build()?;
//!     let request = PdfRequest::new(vec![
//!         "https://example.com".into(),
//!         "<h1>Appendix</h1>".into(),
//!     ]);
//!     let output = print_pdf(&request, &config).await?;
//!     println!("{}", output.combined.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `remote-pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! ## External tools
//!
//! `pdfunite`, `pdfinfo` and `pdftocairo` from poppler must be installed.
//! They are found through `POPPLER_BIN_DIR`, then `PATH`, then `/usr/bin`.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod print;
pub mod progress;
pub mod request;
pub mod tools;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{BackendError, BackendSession, BackendStatus, ChromeBackend, ClipRect, RenderBackend};
pub use config::{PrinterConfig, PrinterConfigBuilder};
pub use error::{JobError, PrinterError, ValidationError};
pub use output::{BatchOutput, BatchStats, PdfResponse, PreviewOutput, PreviewResponse, ScreenshotResponse};
pub use print::{browser_status, capture_png, copy_artifact, print_pdf, print_pdf_sync, print_preview};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use request::{PdfRequest, PngRequest};
pub use tools::{DocumentTools, ToolError};
