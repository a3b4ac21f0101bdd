//! Pipeline stages for batch printing.
//!
//! Each submodule implements one step and is testable on its own.
//!
//! ## Data Flow
//!
//! ```text
//! options ──▶ source ──▶ dispatch ──▶ artifacts ──▶ merge ──▶ preview
//! (validate)  (data: URI) (N sessions) (index order)  (pdfunite) (pdftocairo)
//! ```
//!
//! 1. [`options`]   — validate the request and derive the shared `PrintOptions`
//! 2. [`source`]    — turn each source into a navigable reference
//! 3. [`dispatch`]  — bounded fan-out to backend sessions, fan-in into an
//!    index-addressed arena, then persist successes in order
//! 4. [`artifacts`] — uniquely named files under `<root>/files/<kind>/`
//! 5. [`preview`]   — page count and per-page JPEGs of the merged document
//!
//! [`capture`] is the single-shot screenshot path; it shares `source` and
//! session handling with the batch path but nothing else.

pub mod artifacts;
pub mod capture;
pub mod dispatch;
pub mod options;
pub mod preview;
pub mod source;
