//! # poppler-locate
//!
//! Find the [poppler](https://poppler.freedesktop.org/) command-line tools
//! on the host so callers can invoke them by absolute path instead of
//! hard-coding `/usr/bin`.
//!
//! ## How it works
//!
//! On first call to [`locate`]:
//!
//! 1. If `POPPLER_BIN_DIR` is set, every tool is resolved inside it.
//! 2. Otherwise each entry of `PATH` is searched for the tool.
//! 3. If still absent, the conventional `/usr/bin/<tool>` path is returned
//!    so the eventual spawn error names a concrete location.
//!
//! The result is cached for the lifetime of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use poppler_locate::{locate, tool_version, Tool};
//!
//! let tools = locate();
//! println!("pdfunite: {}", tools.path(Tool::PdfUnite).display());
//! if let Ok(v) = tool_version(tools.path(Tool::PdfToCairo)) {
//!     println!("pdftocairo {v}");
//! }
//! ```
//!
//! ## Environment variable overrides
//!
//! - `POPPLER_BIN_DIR` — directory holding the poppler binaries.

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Directory consulted when neither `POPPLER_BIN_DIR` nor `PATH` yields a hit.
pub const FALLBACK_BIN_DIR: &str = "/usr/bin";

/// Environment variable naming an explicit poppler binary directory.
pub const BIN_DIR_ENV: &str = "POPPLER_BIN_DIR";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by poppler-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// The tool could not be started at all.
    #[error("Failed to run '{path}': {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but its version banner could not be parsed.
    #[error("Unrecognised version output from '{path}': {output:?}")]
    UnknownVersion { path: PathBuf, output: String },
}

// ── Tool identity ────────────────────────────────────────────────────────────

/// The poppler utilities this crate knows how to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// `pdfinfo` — prints `Key: value` document information.
    PdfInfo,
    /// `pdftocairo` — rasterises pages to image files.
    PdfToCairo,
    /// `pdfunite` — concatenates documents.
    PdfUnite,
}

impl Tool {
    /// Every known tool, in a stable order.
    pub const ALL: [Tool; 3] = [Tool::PdfInfo, Tool::PdfToCairo, Tool::PdfUnite];

    /// Executable file name.
    pub fn binary_name(self) -> &'static str {
        match self {
            Tool::PdfInfo => "pdfinfo",
            Tool::PdfToCairo => "pdftocairo",
            Tool::PdfUnite => "pdfunite",
        }
    }
}

/// Resolved absolute paths for each poppler tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    pub pdfinfo: PathBuf,
    pub pdftocairo: PathBuf,
    pub pdfunite: PathBuf,
}

impl ToolSet {
    /// Path for a single tool.
    pub fn path(&self, tool: Tool) -> &Path {
        match tool {
            Tool::PdfInfo => &self.pdfinfo,
            Tool::PdfToCairo => &self.pdftocairo,
            Tool::PdfUnite => &self.pdfunite,
        }
    }

    /// All three tools resolved inside `dir`, without checking they exist.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            pdfinfo: dir.join(Tool::PdfInfo.binary_name()),
            pdftocairo: dir.join(Tool::PdfToCairo.binary_name()),
            pdfunite: dir.join(Tool::PdfUnite.binary_name()),
        }
    }

    /// Returns `true` when every tool path points at an existing file.
    pub fn all_present(&self) -> bool {
        Tool::ALL.iter().all(|t| self.path(*t).is_file())
    }
}

// ── Thread-safe singleton cache ──────────────────────────────────────────────

static RESOLVED: OnceLock<ToolSet> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Resolve every poppler tool, caching the answer for the process lifetime.
///
/// Safe to call from multiple threads; the lookup runs at most a handful of
/// times and all callers observe the same result.
pub fn locate() -> &'static ToolSet {
    RESOLVED.get_or_init(|| {
        let bin_dir = std::env::var_os(BIN_DIR_ENV).map(PathBuf::from);
        let path_var = std::env::var_os("PATH");
        let search: Vec<PathBuf> = path_var
            .as_deref()
            .map(|p| std::env::split_paths(p).collect())
            .unwrap_or_default();
        resolve(bin_dir.as_deref(), &search)
    })
}

/// Resolve a single tool against an explicit override directory and search path.
///
/// Never fails: when nothing matches, [`FALLBACK_BIN_DIR`] is used.
pub fn find_tool(tool: Tool, bin_dir: Option<&Path>, search: &[PathBuf]) -> PathBuf {
    let name = tool.binary_name();

    if let Some(dir) = bin_dir {
        return dir.join(name);
    }

    search
        .iter()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
        .unwrap_or_else(|| Path::new(FALLBACK_BIN_DIR).join(name))
}

/// Run `<tool> -v` and extract the dotted version number it reports.
///
/// poppler prints its banner on stderr (`pdfunite version 22.02.0`); some
/// distributions route it to stdout, so both streams are inspected.
pub fn tool_version(path: &Path) -> Result<String, LocateError> {
    let output = Command::new(path)
        .arg("-v")
        .output()
        .map_err(|e| LocateError::Spawn {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut text = String::from_utf8_lossy(&output.stderr).into_owned();
    text.push('\n');
    text.push_str(&String::from_utf8_lossy(&output.stdout));

    parse_version(&text).ok_or_else(|| LocateError::UnknownVersion {
        path: path.to_path_buf(),
        output: text.trim().to_string(),
    })
}

/// Extract `X.Y[.Z]` from a line containing `version`.
pub fn parse_version(banner: &str) -> Option<String> {
    banner.lines().find_map(|line| {
        let (_, rest) = line.split_once("version")?;
        let token = rest.split_whitespace().next()?;
        let looks_numeric = token.chars().next().is_some_and(|c| c.is_ascii_digit())
            && token.chars().all(|c| c.is_ascii_digit() || c == '.');
        looks_numeric.then(|| token.to_string())
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn resolve(bin_dir: Option<&Path>, search: &[PathBuf]) -> ToolSet {
    ToolSet {
        pdfinfo: find_tool(Tool::PdfInfo, bin_dir, search),
        pdftocairo: find_tool(Tool::PdfToCairo, bin_dir, search),
        pdfunite: find_tool(Tool::PdfUnite, bin_dir, search),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
