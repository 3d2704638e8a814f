//! Inference client — sends one multimodal request to the external model
//! endpoint and classifies the outcome.
//!
//! There is deliberately no retry here: repeated calls to a paid inference
//! service must be an explicit caller choice, so a retry policy belongs one
//! level up. Cancellation rides on the request timeout mechanism — dropping
//! the in-flight future aborts the network call and no partial result is
//! ever surfaced.

use async_trait::async_trait;

use super::request::AnalysisRequest;
use crate::config::{AnalysisConfig, Credential};

/// The classified result of one inference call. Exactly one variant applies.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    /// The model answered; `raw_text` is the content field verbatim.
    Success { raw_text: String },
    /// A response arrived but its HTTP status indicates failure.
    UpstreamError { message: String, status_code: u16 },
    /// The call never produced a response (DNS, reset, timeout).
    TransportError { message: String },
    /// HTTP success but the body lacks the expected content field.
    MalformedResponse { raw: String },
}

impl AnalysisOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Internal classification label, for logging only. The user-visible
    /// failure message is a single generic string regardless of variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::UpstreamError { .. } => "upstream_error",
            Self::TransportError { .. } => "transport_error",
            Self::MalformedResponse { .. } => "malformed_response",
        }
    }
}

/// Seam between the pipeline and the external endpoint.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    async fn infer(&self, request: &AnalysisRequest) -> AnalysisOutcome;
}

/// Production client for an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiVisionClient {
    config: AnalysisConfig,
    credential: Credential,
    client: reqwest::Client,
}

impl OpenAiVisionClient {
    pub fn new(config: AnalysisConfig, credential: Credential) -> Self {
        Self {
            config,
            credential,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl InferenceBackend for OpenAiVisionClient {
    async fn infer(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let body = request.to_body(&self.config);

        let response = match self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(self.credential.expose())
            .timeout(self.config.inference_timeout)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let message = if e.is_timeout() {
                    format!(
                        "request timed out after {:?}",
                        self.config.inference_timeout
                    )
                } else {
                    e.to_string()
                };
                return AnalysisOutcome::TransportError { message };
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return AnalysisOutcome::TransportError {
                    message: e.to_string(),
                }
            }
        };

        classify_response(status, &text)
    }
}

/// Generic message for an error body that carries no usable detail.
const GENERIC_UPSTREAM_MESSAGE: &str = "inference provider returned an error";

/// Classify a received HTTP response into an outcome.
///
/// Pure so the ordering rules are testable without a server. Order matters:
/// a non-success status is always an upstream error (surfacing the body's
/// `error.message` when present), and a 200 body missing
/// `choices[0].message.content` must not be mistaken for success.
pub fn classify_response(status: u16, body: &str) -> AnalysisOutcome {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

    if !(200..300).contains(&status) {
        let message = parsed
            .as_ref()
            .and_then(|v| v["error"]["message"].as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| GENERIC_UPSTREAM_MESSAGE.to_string());
        return AnalysisOutcome::UpstreamError {
            message,
            status_code: status,
        };
    }

    let content = parsed
        .as_ref()
        .and_then(|v| v["choices"][0]["message"]["content"].as_str());

    match content {
        Some(text) => AnalysisOutcome::Success {
            raw_text: text.to_string(),
        },
        None => AnalysisOutcome::MalformedResponse {
            raw: body.to_string(),
        },
    }
}

/// Mock backend for orchestrator tests — returns a configured outcome and
/// counts invocations.
pub struct MockInference {
    outcome: AnalysisOutcome,
    calls: std::sync::atomic::AtomicUsize,
}

impl MockInference {
    pub fn new(outcome: AnalysisOutcome) -> Self {
        Self {
            outcome,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    pub fn succeeding(raw_text: &str) -> Self {
        Self::new(AnalysisOutcome::Success {
            raw_text: raw_text.to_string(),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[async_trait]
impl InferenceBackend for MockInference {
    async fn infer(&self, _request: &AnalysisRequest) -> AnalysisOutcome {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.outcome.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_200_with_content_is_success() {
        let body = r####"{"choices":[{"message":{"role":"assistant","content":"### Assessment\n- clean wound"}}]}"####;
        let outcome = classify_response(200, body);
        assert_eq!(
            outcome,
            AnalysisOutcome::Success {
                raw_text: "### Assessment\n- clean wound".into()
            }
        );
    }

    #[test]
    fn http_200_without_content_is_malformed() {
        let body = r#"{"choices":[]}"#;
        let outcome = classify_response(200, body);
        assert!(matches!(
            outcome,
            AnalysisOutcome::MalformedResponse { raw } if raw == body
        ));
    }

    #[test]
    fn http_200_non_json_is_malformed() {
        let outcome = classify_response(200, "<html>gateway</html>");
        assert!(matches!(outcome, AnalysisOutcome::MalformedResponse { .. }));
    }

    #[test]
    fn http_4xx_surfaces_upstream_message() {
        let body = r#"{"error":{"message":"Invalid API key","type":"auth_error"}}"#;
        let outcome = classify_response(401, body);
        assert_eq!(
            outcome,
            AnalysisOutcome::UpstreamError {
                message: "Invalid API key".into(),
                status_code: 401
            }
        );
    }

    #[test]
    fn http_5xx_without_message_gets_generic_text() {
        let outcome = classify_response(502, "bad gateway");
        assert!(matches!(
            outcome,
            AnalysisOutcome::UpstreamError { message, status_code: 502 }
                if message == GENERIC_UPSTREAM_MESSAGE
        ));
    }

    #[test]
    fn error_status_with_content_shaped_body_is_still_upstream_error() {
        // A 500 must never be classified as success even if the body happens
        // to contain a content field.
        let body = r#"{"choices":[{"message":{"content":"partial"}}]}"#;
        let outcome = classify_response(500, body);
        assert!(matches!(outcome, AnalysisOutcome::UpstreamError { .. }));
    }

    #[test]
    fn empty_error_message_falls_back_to_generic() {
        let body = r#"{"error":{"message":""}}"#;
        let outcome = classify_response(429, body);
        assert!(matches!(
            outcome,
            AnalysisOutcome::UpstreamError { message, .. } if message == GENERIC_UPSTREAM_MESSAGE
        ));
    }

    #[test]
    fn outcome_kind_labels() {
        assert_eq!(
            AnalysisOutcome::Success { raw_text: "x".into() }.kind(),
            "success"
        );
        assert_eq!(
            AnalysisOutcome::TransportError { message: "dns".into() }.kind(),
            "transport_error"
        );
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        use crate::analysis::context::AnalysisContext;
        use crate::analysis::image::ImagePayload;
        use crate::analysis::request::build;

        // Bind then drop a listener so the port is known to be closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = AnalysisConfig {
            endpoint: format!("http://127.0.0.1:{port}/v1/chat/completions"),
            inference_timeout: std::time::Duration::from_secs(5),
            ..AnalysisConfig::default()
        };
        let client = OpenAiVisionClient::new(config, Credential::new("sk-test"));

        let ctx = AnalysisContext {
            guidelines_text: "g".into(),
            instruction_text: "i".into(),
            guidelines_loaded: false,
            instruction_loaded: false,
        };
        let image = ImagePayload::from_bytes(vec![0xFF, 0xD8, 0xFF, 0x00]).unwrap();
        let request = build(&ctx, image).unwrap();

        let outcome = client.infer(&request).await;
        assert_eq!(outcome.kind(), "transport_error");
        assert!(matches!(
            outcome,
            AnalysisOutcome::TransportError { message } if !message.is_empty()
        ));
    }

    #[tokio::test]
    async fn mock_backend_counts_calls() {
        use crate::analysis::context::AnalysisContext;
        use crate::analysis::image::ImagePayload;
        use crate::analysis::request::build;

        let backend = MockInference::succeeding("ok");
        let ctx = AnalysisContext {
            guidelines_text: "g".into(),
            instruction_text: "i".into(),
            guidelines_loaded: false,
            instruction_loaded: false,
        };
        let image = ImagePayload::from_bytes(vec![0xFF, 0xD8, 0xFF, 0x00]).unwrap();
        let request = build(&ctx, image).unwrap();

        assert_eq!(backend.call_count(), 0);
        let outcome = backend.infer(&request).await;
        assert!(outcome.is_success());
        assert_eq!(backend.call_count(), 1);
    }
}
