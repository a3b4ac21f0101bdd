//! Print-option derivation: [`PdfRequest`] → immutable [`PrintOptions`].
//!
//! Validation happens here, before the dispatcher opens a single session,
//! so a malformed request never costs a backend round-trip.

use crate::error::ValidationError;
use crate::request::PdfRequest;
use serde::{Deserialize, Serialize};

/// Template used when a footer is given but no header.
pub const EMPTY_HEADER: &str = "<header></header>";
/// Template used when a header is given but no footer.
pub const EMPTY_FOOTER: &str = "<footer></footer>";

/// Page margins in inches. `None` leaves the backend default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub left: Option<f64>,
    pub right: Option<f64>,
}

/// Paper dimensions in inches.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaperSize {
    pub width: f64,
    pub height: f64,
}

/// Per-batch print configuration shared by every job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintOptions {
    pub margins: Margins,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    pub paper: Option<PaperSize>,
    pub display_header_footer: bool,
    pub print_background: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            margins: Margins::default(),
            header_template: None,
            footer_template: None,
            paper: None,
            display_header_footer: false,
            print_background: true,
        }
    }
}

impl PrintOptions {
    /// Derive print options from a request.
    ///
    /// `header_style` is prepended to the caller's header and footer
    /// templates; Chrome renders those templates in an isolated context
    /// that does not see the page's own stylesheets.
    pub fn from_request(
        request: &PdfRequest,
        header_style: &str,
    ) -> Result<Self, ValidationError> {
        let mut options = PrintOptions::default();

        if let Some(header) = &request.header {
            if request.margin_top.is_none() {
                return Err(ValidationError::HeaderWithoutTopMargin);
            }
            options.display_header_footer = true;
            options.header_template = Some(format!("{header_style}{header}"));
            options.footer_template = Some(EMPTY_FOOTER.to_string());
        }

        if let Some(footer) = &request.footer {
            if request.margin_bottom.is_none() {
                return Err(ValidationError::FooterWithoutBottomMargin);
            }
            options.display_header_footer = true;
            options.footer_template = Some(format!("{header_style}{footer}"));
            if options.header_template.is_none() {
                options.header_template = Some(EMPTY_HEADER.to_string());
            }
        }

        options.margins = Margins {
            top: checked_margin("marginTop", request.margin_top)?,
            bottom: checked_margin("marginBottom", request.margin_bottom)?,
            left: checked_margin("marginLeft", request.margin_left)?,
            right: checked_margin("marginRight", request.margin_right)?,
        };

        options.paper = match request.paper_size.as_slice() {
            [] => None,
            [width, height] => {
                for (field, value) in [("paperSize[0]", *width), ("paperSize[1]", *height)] {
                    if !value.is_finite() || value <= 0.0 {
                        return Err(ValidationError::InvalidNumber { field, value });
                    }
                }
                Some(PaperSize {
                    width: *width,
                    height: *height,
                })
            }
            other => return Err(ValidationError::PaperSize { len: other.len() }),
        };

        Ok(options)
    }
}

fn checked_margin(field: &'static str, value: Option<f64>) -> Result<Option<f64>, ValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ValidationError::InvalidNumber { field, value: v }),
        other => Ok(other),
    }
}
