//! External document tools: merge, info extraction, rasterisation.
//!
//! All three are poppler command-line programs run through
//! `tokio::process`. Each call is bounded by a timeout and the child is
//! killed if the future is dropped, so a wedged tool cannot outlive the
//! request that started it.

use poppler_locate::{tool_version, LocateError, Tool, ToolSet};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Why a tool invocation failed.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("failed to start '{path}': {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("'{path}' exited with {status}: {stderr}")]
    Failed {
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("'{path}' did not finish within {secs}s")]
    Timeout { path: PathBuf, secs: u64 },
}

/// Paths of the three poppler tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentTools {
    /// Prints `Key: value` document information.
    pub info: PathBuf,
    /// Rasterises each page to a numbered image.
    pub rasterizer: PathBuf,
    /// Concatenates documents.
    pub merger: PathBuf,
}

impl Default for DocumentTools {
    /// Whatever [`poppler_locate::locate`] finds on this host.
    fn default() -> Self {
        Self::from_tool_set(poppler_locate::locate())
    }
}

impl DocumentTools {
    pub fn from_tool_set(set: &ToolSet) -> Self {
        Self {
            info: set.path(Tool::PdfInfo).to_path_buf(),
            rasterizer: set.path(Tool::PdfToCairo).to_path_buf(),
            merger: set.path(Tool::PdfUnite).to_path_buf(),
        }
    }

    /// All three tools inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::from_tool_set(&ToolSet::in_dir(dir))
    }

    fn tool_set(&self) -> ToolSet {
        ToolSet {
            pdfinfo: self.info.clone(),
            pdftocairo: self.rasterizer.clone(),
            pdfunite: self.merger.clone(),
        }
    }

    /// `true` when every configured path is an existing file.
    pub fn all_present(&self) -> bool {
        self.tool_set().all_present()
    }

    /// Version banner of each tool, in [`Tool::ALL`] order.
    ///
    /// Runs each binary with `-v`; blocking.
    pub fn versions(&self) -> Vec<(Tool, PathBuf, Result<String, LocateError>)> {
        let set = self.tool_set();
        Tool::ALL
            .iter()
            .map(|&tool| {
                let path = set.path(tool).to_path_buf();
                let version = tool_version(&path);
                (tool, path, version)
            })
            .collect()
    }

    /// Merge `inputs` (in order) into `output`.
    pub async fn merge(
        &self,
        inputs: &[PathBuf],
        output: &Path,
        timeout: Duration,
    ) -> Result<(), ToolError> {
        let mut cmd = Command::new(&self.merger);
        cmd.args(inputs).arg(output);
        run(cmd, &self.merger, timeout).await.map(|_| ())
    }

    /// Run the info tool on `pdf` and return its stdout.
    pub async fn info(&self, pdf: &Path, timeout: Duration) -> Result<String, ToolError> {
        let mut cmd = Command::new(&self.info);
        cmd.arg(pdf);
        let output = run(cmd, &self.info, timeout).await?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Rasterise every page of `pdf` to `<prefix>-<n>.jpg`, longest edge `scale` px.
    pub async fn rasterize(
        &self,
        pdf: &Path,
        prefix: &Path,
        scale: u32,
        timeout: Duration,
    ) -> Result<(), ToolError> {
        let mut cmd = Command::new(&self.rasterizer);
        cmd.arg("-jpeg")
            .arg("-scale-to")
            .arg(scale.to_string())
            .arg(pdf)
            .arg(prefix);
        run(cmd, &self.rasterizer, timeout).await.map(|_| ())
    }
}

async fn run(mut cmd: Command, path: &Path, timeout: Duration) -> Result<Output, ToolError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    debug!("Running {:?}", cmd.as_std());

    let output = tokio::time::timeout(timeout, cmd.output())
        .await
        .map_err(|_| ToolError::Timeout {
            path: path.to_path_buf(),
            secs: timeout.as_secs(),
        })?
        .map_err(|e| ToolError::Spawn {
            path: path.to_path_buf(),
            source: e,
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            path: path.to_path_buf(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}
