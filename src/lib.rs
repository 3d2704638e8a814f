//! Woundsight — wound photograph analysis and report generation.
//!
//! The pipeline runs in stages: validate and encode the uploaded image,
//! assemble grounding context (clinical guidelines + instruction template,
//! each with an independent fallback), build one multimodal request, call the
//! external vision model, and normalize its answer into content blocks. On
//! demand the blocks are paginated into a printable PDF report.
//!
//! The surrounding application concerns — account storage, upload UI,
//! routing, persisted interaction logs — live outside this crate; the
//! pipeline only sees them through the [`interaction_log::InteractionSink`]
//! seam.

pub mod analysis;
pub mod config;
pub mod interaction_log;
pub mod report;

pub use analysis::{AnalysisError, AnalysisOutcome, Analyzer, ImagePayload};
pub use config::{AnalysisConfig, Credential};
pub use report::{render, ReportMeta};

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries embedding the pipeline.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Assemble a production pipeline: HTTPS fetcher, OpenAI-compatible vision
/// client, and the tracing interaction sink.
pub fn production_analyzer(config: AnalysisConfig, credential: Credential) -> Analyzer {
    let fetcher = Arc::new(analysis::HttpTextFetcher::new(config.fetch_timeout));
    let backend = Arc::new(analysis::OpenAiVisionClient::new(
        config.clone(),
        credential,
    ));
    let sink = Arc::new(interaction_log::TracingSink);
    Analyzer::new(config, fetcher, backend, sink)
}
