//! Request types accepted by the public entry points.
//!
//! These mirror the JSON/form payloads an HTTP front end would bind, so the
//! field names are camelCase on the wire.

use crate::backend::{ClipRect, ElementSelector};
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// A batch print request: many sources → one merged PDF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PdfRequest {
    /// URLs and/or raw HTML documents, in output order.
    pub data: Vec<String>,
    /// Return the merged file itself instead of a JSON description.
    pub download: bool,
    /// Header template (HTML). Requires `margin_top`.
    pub header: Option<String>,
    /// Footer template (HTML). Requires `margin_bottom`.
    pub footer: Option<String>,
    pub margin_top: Option<f64>,
    pub margin_bottom: Option<f64>,
    pub margin_left: Option<f64>,
    pub margin_right: Option<f64>,
    /// `[width, height]` in inches.
    pub paper_size: Vec<f64>,
}

impl PdfRequest {
    pub fn new(data: Vec<String>) -> Self {
        Self {
            data,
            ..Default::default()
        }
    }

    /// Reject requests that carry no sources at all.
    pub fn validate_sources(&self) -> Result<(), ValidationError> {
        if self.data.is_empty() {
            return Err(ValidationError::EmptySources);
        }
        Ok(())
    }
}

/// A single-source screenshot request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PngRequest {
    /// URL or raw HTML document.
    pub data: String,
    pub download: bool,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub scale: Option<f64>,
    /// Capture the element with this DOM id.
    pub dom_id: Option<String>,
    /// Capture every element matching this XPath.
    pub xpath: Option<String>,
}

/// What region of the page a screenshot should cover.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureTarget {
    /// The whole viewport.
    Viewport,
    /// An explicit rectangle.
    Clip(ClipRect),
    /// The union of every matching element's bounding box.
    Elements(ElementSelector),
}

impl PngRequest {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    fn has_numeric_clip(&self) -> bool {
        self.x.is_some()
            || self.y.is_some()
            || self.width.is_some()
            || self.height.is_some()
            || self.scale.is_some()
    }

    /// Validate the request and decide what to capture.
    ///
    /// Numeric fields override a default clip of `x=0, y=0, width=1024,
    /// height=150, scale=1`; unspecified fields keep their defaults.
    pub fn capture_target(&self) -> Result<CaptureTarget, ValidationError> {
        if self.data.trim().is_empty() {
            return Err(ValidationError::EmptySources);
        }

        let selector = match (non_empty(&self.dom_id), non_empty(&self.xpath)) {
            (Some(_), Some(_)) => return Err(ValidationError::AmbiguousSelector),
            (Some(id), None) => Some(ElementSelector::Css(format!("#{id}"))),
            (None, Some(xpath)) => Some(ElementSelector::XPath(xpath.to_string())),
            (None, None) => None,
        };

        match selector {
            Some(_) if self.has_numeric_clip() => Err(ValidationError::ConflictingCapture),
            Some(sel) => Ok(CaptureTarget::Elements(sel)),
            None if self.has_numeric_clip() => {
                let mut clip = ClipRect::default();
                if let Some(x) = self.x {
                    clip.x = x;
                }
                if let Some(y) = self.y {
                    clip.y = y;
                }
                if let Some(width) = self.width {
                    clip.width = positive("width", width)?;
                }
                if let Some(height) = self.height {
                    clip.height = positive("height", height)?;
                }
                if let Some(scale) = self.scale {
                    clip.scale = positive("scale", scale)?;
                }
                Ok(CaptureTarget::Clip(clip))
            }
            None => Ok(CaptureTarget::Viewport),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn positive(field: &'static str, value: f64) -> Result<f64, ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ValidationError::InvalidNumber { field, value })
    }
}
