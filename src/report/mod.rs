//! Report pipeline: model output normalization and PDF rendering.

pub mod format;
pub mod render;

pub use format::{format_analysis, ContentBlock, Span};
pub use render::{render, Clock, FixedClock, ReportMeta, SystemClock, REPORT_FILENAME};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    /// Rendering was requested without a successful analysis. A call-site
    /// bug — fail loudly instead of emitting an empty document.
    #[error("no successful analysis to render")]
    NoContent,

    #[error("PDF generation error: {0}")]
    Pdf(String),
}
