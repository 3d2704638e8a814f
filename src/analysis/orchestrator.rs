//! End-to-end analysis orchestration.
//!
//! One `analyze_*` call owns its image, context, and request — nothing is
//! shared or cached across invocations, so concurrent analyses are
//! independent. The interaction sink receives start / complete / error
//! events and is never awaited.

use std::path::Path;
use std::sync::Arc;

use super::inference::InferenceBackend;
use super::{assemble, build, AnalysisContext, AnalysisError, ImagePayload, TextFetcher};
use crate::config::AnalysisConfig;
use crate::interaction_log::{InteractionEvent, InteractionSink};

/// The assembled analysis pipeline.
pub struct Analyzer {
    config: AnalysisConfig,
    fetcher: Arc<dyn TextFetcher>,
    backend: Arc<dyn InferenceBackend>,
    sink: Arc<dyn InteractionSink>,
}

impl Analyzer {
    pub fn new(
        config: AnalysisConfig,
        fetcher: Arc<dyn TextFetcher>,
        backend: Arc<dyn InferenceBackend>,
        sink: Arc<dyn InteractionSink>,
    ) -> Self {
        Self {
            config,
            fetcher,
            backend,
            sink,
        }
    }

    /// Analyze an image file. Validation runs before any network call.
    pub async fn analyze_file(
        &self,
        session_id: &str,
        path: &Path,
    ) -> Result<String, AnalysisError> {
        self.sink.record(InteractionEvent::start(session_id));

        let image = match ImagePayload::from_file(path) {
            Ok(image) => image,
            Err(e) => return Err(self.reject_input(session_id, e)),
        };

        self.run(session_id, image).await
    }

    /// Analyze raw image bytes (e.g. an upload already held in memory).
    pub async fn analyze_bytes(
        &self,
        session_id: &str,
        bytes: Vec<u8>,
    ) -> Result<String, AnalysisError> {
        self.sink.record(InteractionEvent::start(session_id));

        let image = match ImagePayload::from_bytes(bytes) {
            Ok(image) => image,
            Err(e) => return Err(self.reject_input(session_id, e)),
        };

        self.run(session_id, image).await
    }

    fn reject_input(&self, session_id: &str, e: super::ImageError) -> AnalysisError {
        tracing::warn!(session_id, error = %e, "image rejected before analysis");
        self.sink
            .record(InteractionEvent::error(session_id, &e.to_string()));
        AnalysisError::InvalidImage(e)
    }

    /// Run the network stages with a validated image.
    async fn run(&self, session_id: &str, image: ImagePayload) -> Result<String, AnalysisError> {
        tracing::info!(
            session_id,
            mime = image.mime_type().as_str(),
            size_bytes = image.size_bytes(),
            "starting wound analysis"
        );

        let context = assemble(self.fetcher.as_ref(), &self.config).await;
        self.run_with_context(session_id, context, image).await
    }

    async fn run_with_context(
        &self,
        session_id: &str,
        context: AnalysisContext,
        image: ImagePayload,
    ) -> Result<String, AnalysisError> {
        let start = std::time::Instant::now();

        let request = match build(&context, image) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(session_id, error = %e, "request assembly failed");
                self.sink
                    .record(InteractionEvent::error(session_id, &e.to_string()));
                return Err(e.into());
            }
        };
        let outcome = self.backend.infer(&request).await;

        match outcome {
            super::AnalysisOutcome::Success { raw_text } => {
                tracing::info!(
                    session_id,
                    elapsed_ms = %start.elapsed().as_millis(),
                    text_len = raw_text.len(),
                    "wound analysis complete"
                );
                self.sink.record(InteractionEvent::complete(session_id));
                Ok(raw_text)
            }
            failure => {
                // Classified detail stays in the log; the caller gets one
                // generic failure regardless of variant.
                let detail = match &failure {
                    super::AnalysisOutcome::UpstreamError {
                        message,
                        status_code,
                    } => format!("upstream error (status {status_code}): {message}"),
                    super::AnalysisOutcome::TransportError { message } => {
                        format!("transport error: {message}")
                    }
                    _ => "malformed response from inference provider".to_string(),
                };
                tracing::warn!(
                    session_id,
                    kind = failure.kind(),
                    detail = %detail,
                    "wound analysis failed"
                );
                self.sink
                    .record(InteractionEvent::error(session_id, &detail));
                Err(AnalysisError::AnalysisFailed)
            }
        }
    }
}
