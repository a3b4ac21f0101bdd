//! Configuration types for the print service.
//!
//! Every knob lives in [`PrinterConfig`], built once at startup through
//! [`PrinterConfigBuilder`] and then passed by reference into each entry
//! point. Nothing in the library reads the environment on its own; the
//! binary maps its flags and `REMOTE_PDF_*` variables onto the builder.

use crate::backend::RenderBackend;
use crate::error::PrinterError;
use crate::progress::ProgressCallback;
use crate::tools::DocumentTools;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Artifact directory names under `<root>/files/`.
pub const PDF_DIR: &str = "pdfs";
pub const PREVIEW_DIR: &str = "previews";
pub const PNG_DIR: &str = "pngs";
pub const SOURCE_DIR: &str = "sources";

/// Configuration for the print pipeline.
///
/// # Example
/// ```rust
/// use remote_pdf_printer::PrinterConfig;
///
/// let config = PrinterConfig::builder()
///     .chrome_uri("chrome:9222")
///     .root_dir("/srv/remote-pdf")
///     .max_sessions(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_sessions, 4);
/// ```
#[derive(Clone)]
pub struct PrinterConfig {
    /// DevTools address of the remote browser. Default: `127.0.0.1:1337`.
    ///
    /// Either `host:port` (resolved through `/json/version`) or a full
    /// `ws://…/devtools/browser/<id>` URL.
    pub chrome_uri: String,

    /// Pre-constructed backend. Takes precedence over `chrome_uri`.
    pub backend: Option<Arc<dyn RenderBackend>>,

    /// Root directory; artifacts go to `<root>/files/<kind>/`.
    pub root_dir: PathBuf,

    /// Prefix for URLs handed back to clients. Default: `http://127.0.0.1:3000`.
    pub public_base_url: String,

    /// Prepended to every header/footer template. Default: empty.
    pub header_style_template: String,

    /// Persist each request's raw source list under `files/sources/`. Default: false.
    pub debug_sources: bool,

    /// Maximum backend sessions in flight for one batch. Default: 8.
    pub max_sessions: usize,

    /// Per-job deadline in seconds. Default: 60.
    pub job_timeout_secs: u64,

    /// Whole-batch deadline in seconds; `None` waits for every job. Default: 300.
    pub batch_timeout_secs: Option<u64>,

    /// Deadline for each external tool invocation. Default: 120.
    pub tool_timeout_secs: u64,

    /// Include the indices of failed sources in responses. Default: false.
    ///
    /// Off reproduces the historical contract: failed sources are silently
    /// omitted and the merged document covers only the successes.
    pub report_failed_jobs: bool,

    /// Longest edge of preview images in pixels. Default: 1024.
    pub preview_scale: u32,

    /// Paths of the external document tools.
    pub tools: DocumentTools,

    /// Optional progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            chrome_uri: "127.0.0.1:1337".to_string(),
            backend: None,
            root_dir: PathBuf::from("."),
            public_base_url: "http://127.0.0.1:3000".to_string(),
            header_style_template: String::new(),
            debug_sources: false,
            max_sessions: 8,
            job_timeout_secs: 60,
            batch_timeout_secs: Some(300),
            tool_timeout_secs: 120,
            report_failed_jobs: false,
            preview_scale: 1024,
            tools: DocumentTools::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PrinterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrinterConfig")
            .field("chrome_uri", &self.chrome_uri)
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("root_dir", &self.root_dir)
            .field("public_base_url", &self.public_base_url)
            .field("header_style_template_len", &self.header_style_template.len())
            .field("debug_sources", &self.debug_sources)
            .field("max_sessions", &self.max_sessions)
            .field("job_timeout_secs", &self.job_timeout_secs)
            .field("batch_timeout_secs", &self.batch_timeout_secs)
            .field("tool_timeout_secs", &self.tool_timeout_secs)
            .field("report_failed_jobs", &self.report_failed_jobs)
            .field("preview_scale", &self.preview_scale)
            .field("tools", &self.tools)
            .finish()
    }
}

impl PrinterConfig {
    /// Create a new builder for `PrinterConfig`.
    pub fn builder() -> PrinterConfigBuilder {
        PrinterConfigBuilder {
            config: Self::default(),
        }
    }

    /// Default location of the header style template under `root`.
    pub fn default_header_style_path(root: &Path) -> PathBuf {
        root.join("css").join("default-header.css.txt")
    }
}

/// Builder for [`PrinterConfig`].
pub struct PrinterConfigBuilder {
    config: PrinterConfig,
}

impl fmt::Debug for PrinterConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrinterConfigBuilder").field(&self.config).finish()
    }
}

impl PrinterConfigBuilder {
    pub fn chrome_uri(mut self, uri: impl Into<String>) -> Self {
        self.config.chrome_uri = uri.into();
        self
    }

    pub fn backend(mut self, backend: Arc<dyn RenderBackend>) -> Self {
        self.config.backend = Some(backend);
        self
    }

    pub fn root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.root_dir = dir.into();
        self
    }

    pub fn public_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.public_base_url = url.into();
        self
    }

    pub fn header_style_template(mut self, template: impl Into<String>) -> Self {
        self.config.header_style_template = template.into();
        self
    }

    pub fn debug_sources(mut self, v: bool) -> Self {
        self.config.debug_sources = v;
        self
    }

    pub fn max_sessions(mut self, n: usize) -> Self {
        self.config.max_sessions = n.max(1);
        self
    }

    pub fn job_timeout_secs(mut self, secs: u64) -> Self {
        self.config.job_timeout_secs = secs;
        self
    }

    pub fn batch_timeout_secs(mut self, secs: Option<u64>) -> Self {
        self.config.batch_timeout_secs = secs;
        self
    }

    pub fn tool_timeout_secs(mut self, secs: u64) -> Self {
        self.config.tool_timeout_secs = secs;
        self
    }

    pub fn report_failed_jobs(mut self, v: bool) -> Self {
        self.config.report_failed_jobs = v;
        self
    }

    pub fn preview_scale(mut self, px: u32) -> Self {
        self.config.preview_scale = px;
        self
    }

    pub fn tools(mut self, tools: DocumentTools) -> Self {
        self.config.tools = tools;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PrinterConfig, PrinterError> {
        let c = &self.config;
        if c.chrome_uri.trim().is_empty() && c.backend.is_none() {
            return Err(PrinterError::InvalidConfig(
                "chrome_uri is empty and no backend was supplied".into(),
            ));
        }
        if c.job_timeout_secs == 0 {
            return Err(PrinterError::InvalidConfig(
                "job timeout must be ≥ 1s".into(),
            ));
        }
        if c.batch_timeout_secs == Some(0) {
            return Err(PrinterError::InvalidConfig(
                "batch timeout must be ≥ 1s".into(),
            ));
        }
        if c.tool_timeout_secs == 0 {
            return Err(PrinterError::InvalidConfig(
                "tool timeout must be ≥ 1s".into(),
            ));
        }
        if c.preview_scale < 16 {
            return Err(PrinterError::InvalidConfig(format!(
                "preview scale must be ≥ 16px, got {}",
                c.preview_scale
            )));
        }
        Ok(self.config)
    }
}
