//! Screenshot capturer: one source, one session, one PNG.

use crate::backend::{BackendError, CaptureRequest, ClipRect, RenderBackend};
use crate::config::PrinterConfig;
use crate::error::PrinterError;
use crate::pipeline::source::navigable_reference;
use crate::request::CaptureTarget;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Smallest rectangle covering every box. `None` for an empty slice.
pub fn union_clip(boxes: &[ClipRect]) -> Option<ClipRect> {
    let first = boxes.first()?;
    let (mut left, mut top) = (first.x, first.y);
    let (mut right, mut bottom) = (first.x + first.width, first.y + first.height);

    for b in &boxes[1..] {
        left = left.min(b.x);
        top = top.min(b.y);
        right = right.max(b.x + b.width);
        bottom = bottom.max(b.y + b.height);
    }

    Some(ClipRect {
        x: left,
        y: top,
        width: right - left,
        height: bottom - top,
        scale: 1.0,
    })
}

/// Snap the origin to whole pixels and stretch the extent so the far edge
/// stays put.
pub fn align_to_pixels(clip: ClipRect) -> ClipRect {
    let x = clip.x.round();
    let y = clip.y.round();
    ClipRect {
        x,
        y,
        width: (clip.width + clip.x - x).round(),
        height: (clip.height + clip.y - y).round(),
        scale: clip.scale,
    }
}

/// Render `source` and capture `target` as PNG bytes.
pub async fn capture_source(
    backend: Arc<dyn RenderBackend>,
    source: &str,
    target: CaptureTarget,
    config: &PrinterConfig,
) -> Result<Vec<u8>, PrinterError> {
    let timeout = Duration::from_secs(config.job_timeout_secs);
    let reference = navigable_reference(source);

    let task = tokio::task::spawn_blocking(move || capture_blocking(backend.as_ref(), &reference, &target, timeout));
    let bytes = tokio::time::timeout(timeout, task)
        .await
        .map_err(|_| PrinterError::Capture {
            detail: format!("timed out after {}s", timeout.as_secs()),
        })?
        .map_err(|e| PrinterError::Internal(format!("Capture task panicked: {}", e)))??;

    if bytes.is_empty() {
        return Err(PrinterError::NoImageReturned);
    }
    Ok(bytes)
}

fn capture_blocking(
    backend: &dyn RenderBackend,
    reference: &str,
    target: &CaptureTarget,
    timeout: Duration,
) -> Result<Vec<u8>, PrinterError> {
    let capture_err = |e: BackendError| PrinterError::Capture {
        detail: e.to_string(),
    };

    let mut session = backend
        .open_session(timeout)
        .map_err(|e| PrinterError::Backend(e.to_string()))?;
    session.navigate(reference).map_err(capture_err)?;

    let clip = match target {
        CaptureTarget::Viewport => None,
        CaptureTarget::Clip(clip) => Some(*clip),
        CaptureTarget::Elements(selector) => {
            let boxes = session.element_boxes(selector).map_err(capture_err)?;
            let union = union_clip(&boxes).ok_or_else(|| PrinterError::Capture {
                detail: format!("no elements matched {:?}", selector),
            })?;
            debug!("Union of {} element boxes: {:?}", boxes.len(), union);
            Some(align_to_pixels(union))
        }
    };

    session
        .capture(&CaptureRequest::png(clip))
        .map_err(capture_err)
}
