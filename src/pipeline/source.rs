//! Source classification: turn a submitted source into something the
//! backend can navigate to.
//!
//! The browser only understands navigable references. URLs (`http`,
//! `https`, `file`, `data`) pass through untouched; anything else is treated
//! as inline markup and wrapped in a base64 `data:text/html` URI. No I/O
//! happens here.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use once_cell::sync::Lazy;
use regex::Regex;

static NAVIGABLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(https?|file|data):").unwrap());

/// Returns `true` when `source` starts with a recognised URI scheme.
pub fn is_navigable(source: &str) -> bool {
    NAVIGABLE.is_match(source)
}

/// Classify `source` and return a reference the backend can load.
pub fn navigable_reference(source: &str) -> String {
    if is_navigable(source) {
        source.to_string()
    } else {
        format!(
            "data:text/html;base64,{}",
            STANDARD.encode(source.as_bytes())
        )
    }
}
