//! Public entry points: batch print, preview, screenshot, backend status.
//!
//! Every entry point validates its request before touching the backend or
//! the filesystem, so a rejected request has no side effects.

use crate::backend::{BackendStatus, ChromeBackend, RenderBackend};
use crate::config::{PrinterConfig, PDF_DIR};
use crate::error::PrinterError;
use crate::output::{BatchOutput, BatchStats, PreviewOutput};
use crate::pipeline::artifacts::ArtifactStore;
use crate::pipeline::capture::capture_source;
use crate::pipeline::dispatch::{collect_artifacts, dispatch_batch, jobs_from_sources};
use crate::pipeline::options::PrintOptions;
use crate::pipeline::preview::generate_previews;
use crate::request::{PdfRequest, PngRequest};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// The configured backend, or a Chrome backend on `config.chrome_uri`.
pub fn resolve_backend(config: &PrinterConfig) -> Arc<dyn RenderBackend> {
    match &config.backend {
        Some(backend) => Arc::clone(backend),
        None => Arc::new(ChromeBackend::new(&config.chrome_uri)),
    }
}

/// Render every source of `request` and merge the results into one PDF.
///
/// # Returns
/// `Ok(BatchOutput)` as long as at least one source rendered. Failed
/// sources are left out of the merged document and listed in
/// `output.failures`.
///
/// # Errors
/// - [`PrinterError::Validation`] before anything is dispatched
/// - [`PrinterError::NothingRendered`] when every source failed
/// - [`PrinterError::Persist`] / [`PrinterError::Merge`] on disk or tool failure
pub async fn print_pdf(
    request: &PdfRequest,
    config: &PrinterConfig,
) -> Result<BatchOutput, PrinterError> {
    let total_start = Instant::now();

    // ── Step 1: Validate ─────────────────────────────────────────────────
    request.validate_sources()?;
    let options = PrintOptions::from_request(request, &config.header_style_template)?;
    let total = request.data.len();
    info!("Printing batch of {} sources", total);

    let store = ArtifactStore::new(config);
    dump_debug_sources(&store, &request.data, config);

    // ── Step 2: Render ───────────────────────────────────────────────────
    let render_start = Instant::now();
    let backend = resolve_backend(config);
    let results = dispatch_batch(backend, jobs_from_sources(&request.data, options), config).await;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    // ── Step 3: Persist in order ─────────────────────────────────────────
    let set = collect_artifacts(results, &store).await?;
    if set.components.is_empty() {
        return Err(PrinterError::NothingRendered {
            total,
            first_error: set
                .failures
                .first()
                .map(|e| e.to_string())
                .unwrap_or_default(),
        });
    }

    // ── Step 4: Merge ────────────────────────────────────────────────────
    let merge_start = Instant::now();
    let combined = store.reserve(PDF_DIR, "-combined.pdf")?;
    config
        .tools
        .merge(
            &set.components,
            &combined,
            Duration::from_secs(config.tool_timeout_secs),
        )
        .await
        .map_err(|e| PrinterError::Merge {
            detail: e.to_string(),
        })?;
    let merge_duration_ms = merge_start.elapsed().as_millis() as u64;

    let stats = BatchStats {
        total_jobs: total,
        rendered_jobs: set.components.len(),
        failed_jobs: set.failures.len(),
        render_duration_ms,
        merge_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };
    info!(
        "Batch complete: {}/{} sources merged into {}, {}ms total",
        stats.rendered_jobs,
        total,
        combined.display(),
        stats.total_duration_ms
    );

    Ok(BatchOutput {
        combined,
        components: set.components,
        failures: set.failures,
        stats,
    })
}

/// [`print_pdf`], then rasterise the merged document one image per page.
pub async fn print_preview(
    request: &PdfRequest,
    config: &PrinterConfig,
) -> Result<PreviewOutput, PrinterError> {
    let batch = print_pdf(request, config).await?;
    let store = ArtifactStore::new(config);
    let (pages, images) = generate_previews(&batch.combined, &store, config).await?;
    Ok(PreviewOutput {
        batch,
        pages,
        images,
    })
}

/// Capture one source as a PNG and persist it under `files/pngs`.
pub async fn capture_png(
    request: &PngRequest,
    config: &PrinterConfig,
) -> Result<PathBuf, PrinterError> {
    let target = request.capture_target()?;
    info!("Capturing screenshot ({:?})", target);

    let store = ArtifactStore::new(config);
    dump_debug_sources(&store, std::slice::from_ref(&request.data), config);

    let bytes = capture_source(resolve_backend(config), &request.data, target, config).await?;
    let path = store.write_png(&bytes)?;
    info!("Screenshot written to {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Best effort: a failed dump is logged and never fails the request.
fn dump_debug_sources(store: &ArtifactStore, sources: &[String], config: &PrinterConfig) {
    if !config.debug_sources {
        return;
    }
    match store.dump_sources(sources) {
        Ok(path) => debug!("Dumped sources to {}", path.display()),
        Err(e) => warn!("Ignoring source dump failure: {}", e),
    }
}

/// Browser version and open targets.
pub async fn browser_status(config: &PrinterConfig) -> Result<BackendStatus, PrinterError> {
    let backend = resolve_backend(config);
    tokio::task::spawn_blocking(move || backend.status())
        .await
        .map_err(|e| PrinterError::Internal(format!("Status task panicked: {}", e)))?
        .map_err(|e| PrinterError::Backend(e.to_string()))
}

/// Copy a produced artifact to `dest` for download.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn copy_artifact(artifact: &Path, dest: &Path) -> Result<u64, PrinterError> {
    let persist = |e: std::io::Error| PrinterError::Persist {
        path: dest.to_path_buf(),
        source: e,
    };

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(persist)?;
    }

    let mut tmp = dest.as_os_str().to_owned();
    tmp.push(".part");
    let tmp = PathBuf::from(tmp);
    let copied = match tokio::fs::copy(artifact, &tmp).await {
        Ok(bytes) => tokio::fs::rename(&tmp, dest).await.map(|_| bytes),
        Err(e) => Err(e),
    };
    if copied.is_err() {
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    copied.map_err(persist)
}

/// Synchronous wrapper around [`print_pdf`].
///
/// Creates a temporary tokio runtime internally.
pub fn print_pdf_sync(
    request: &PdfRequest,
    config: &PrinterConfig,
) -> Result<BatchOutput, PrinterError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| PrinterError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(print_pdf(request, config))
}
