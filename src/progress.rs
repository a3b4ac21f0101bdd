//! Progress-callback trait for per-job batch events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::PrinterConfigBuilder::progress_callback`] to receive
//! events as the dispatcher works through a batch.
//!
//! # Example
//!
//! ```rust
//! use remote_pdf_printer::{BatchProgressCallback, PrinterConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     rendered: AtomicUsize,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_job_complete(&self, index: usize, total_jobs: usize, bytes: usize) {
//!         self.rendered.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("source {index}/{total_jobs} rendered ({bytes} bytes)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { rendered: AtomicUsize::new(0) });
//!
//! let config = PrinterConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the dispatcher as it processes each job of a batch.
///
/// Jobs run concurrently, so `on_job_*` may be called from several threads
/// at once and in any order. All methods default to no-ops.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any session is opened.
    fn on_batch_start(&self, total_jobs: usize) {
        let _ = total_jobs;
    }

    /// Called when a job acquires its dispatch slot.
    ///
    /// `index` is the 0-based submission index.
    fn on_job_start(&self, index: usize, total_jobs: usize) {
        let _ = (index, total_jobs);
    }

    /// Called when a job returned a document.
    fn on_job_complete(&self, index: usize, total_jobs: usize, bytes: usize) {
        let _ = (index, total_jobs, bytes);
    }

    /// Called when a job failed, timed out, or was abandoned.
    fn on_job_error(&self, index: usize, total_jobs: usize, error: &str) {
        let _ = (index, total_jobs, error);
    }

    /// Called once after every job has reported or the batch deadline hit.
    fn on_batch_complete(&self, total_jobs: usize, success_count: usize) {
        let _ = (total_jobs, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PrinterConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
