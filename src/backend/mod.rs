//! Rendering backend seam.
//!
//! The pipeline never talks to a browser directly. It asks a
//! [`RenderBackend`] for a fresh [`BackendSession`] per job, drives that
//! session through navigate → print/capture, and drops it. Dropping the
//! session releases the remote target, so release happens on every exit
//! path including `?` early returns and panics unwinding the job thread.
//!
//! Both traits are synchronous: the production implementation
//! ([`chrome::ChromeBackend`]) wraps the blocking `headless_chrome` client,
//! so the dispatcher runs each session inside `tokio::task::spawn_blocking`.

pub mod chrome;

use crate::pipeline::options::PrintOptions;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub use chrome::ChromeBackend;

/// Failures reported by a backend implementation.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Could not reach the DevTools endpoint or open a target.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Navigation to the source reference failed.
    #[error("navigation failed: {0}")]
    Navigate(String),

    /// Print-to-PDF failed.
    #[error("print failed: {0}")]
    Print(String),

    /// Screenshot capture failed.
    #[error("capture failed: {0}")]
    Capture(String),

    /// Element lookup or box-model query failed.
    #[error("element query failed: {0}")]
    Query(String),

    /// Status endpoint failed.
    #[error("status query failed: {0}")]
    Status(String),
}

/// A rectangle in CSS pixels plus a device scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClipRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl Default for ClipRect {
    /// The seed used when only some clip fields are supplied.
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1024.0,
            height: 150.0,
            scale: 1.0,
        }
    }
}

/// How to find the elements whose union forms a capture region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementSelector {
    /// CSS selector, e.g. `#chart`.
    Css(String),
    /// XPath expression.
    XPath(String),
}

/// Parameters for a single screenshot call.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRequest {
    /// Restrict the capture to this region; `None` captures the viewport.
    pub clip: Option<ClipRect>,
    /// Capture from the compositor surface rather than the view.
    pub from_surface: bool,
}

impl CaptureRequest {
    /// PNG capture from the surface, optionally clipped.
    pub fn png(clip: Option<ClipRect>) -> Self {
        Self {
            clip,
            from_surface: true,
        }
    }
}

/// Summary of one open browser target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSummary {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub url: String,
}

/// What the backend reports about itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendStatus {
    pub browser: String,
    pub protocol_version: String,
    pub targets: Vec<TargetSummary>,
}

/// Factory for per-job sessions against a rendering backend.
///
/// Implementations must be cheap to share (`Arc<dyn RenderBackend>`) and
/// safe to call from many blocking threads at once.
pub trait RenderBackend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Open an independent session. Every call on the returned session
    /// must give up after `timeout`.
    fn open_session(&self, timeout: Duration) -> Result<Box<dyn BackendSession>, BackendError>;

    /// Report backend version and open targets.
    fn status(&self) -> Result<BackendStatus, BackendError>;
}

/// One isolated browser target. Released on drop.
pub trait BackendSession: Send {
    /// Navigate to a backend-navigable reference (URL or `data:` URI) and
    /// wait for the load to finish.
    fn navigate(&mut self, target: &str) -> Result<(), BackendError>;

    /// Print the current page to PDF.
    fn print_pdf(&mut self, options: &PrintOptions) -> Result<Vec<u8>, BackendError>;

    /// Capture the current page as a PNG.
    fn capture(&mut self, request: &CaptureRequest) -> Result<Vec<u8>, BackendError>;

    /// Border-box rectangles of every element matching `selector`, in
    /// document order. An empty vector means nothing matched.
    fn element_boxes(&mut self, selector: &ElementSelector) -> Result<Vec<ClipRect>, BackendError>;
}
