//! Context assembler — gathers the clinical guidelines and instruction
//! template that ground the model's assessment.
//!
//! Both resources live at configured HTTPS locations and may change between
//! uses, so nothing is cached across calls. Each fetch degrades independently
//! to a built-in fallback; assembling a context can therefore never fail.
//! Pipeline availability wins over freshness of the grounding text.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::AnalysisConfig;

/// Built-in instruction used when the remote template is unreachable.
pub const FALLBACK_INSTRUCTION: &str = "\
You are assisting a clinician with wound assessment. Examine the wound in the \
provided photograph and describe: wound type, approximate size and depth, \
tissue appearance, signs of infection, and exudate. Then give step-by-step, \
evidence-based care recommendations. Close with a reminder that a healthcare \
professional must review the wound in person.";

/// Built-in guidelines summary used when the remote document is unreachable.
pub const FALLBACK_GUIDELINES: &str = "\
General wound care principles: cleanse with sterile saline; select dressings \
according to exudate level and wound bed condition; maintain a moist wound \
environment; monitor for erythema, warmth, swelling, odour, and increasing \
pain as signs of infection; reassess at every dressing change.";

/// Grounding text for one analysis call.
///
/// The `*_loaded` flags record whether the remote resource was used or the
/// fallback substituted — observable for diagnostics and tests, and consulted
/// by the request builder (the guidelines clause is only appended when the
/// remote document actually loaded).
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub guidelines_text: String,
    pub instruction_text: String,
    pub guidelines_loaded: bool,
    pub instruction_loaded: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("resource returned status {0}")]
    Status(u16),
}

/// Retrieval seam for the two context resources.
#[async_trait]
pub trait TextFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// HTTPS fetcher with a per-request timeout.
pub struct HttpTextFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTextFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl TextFetcher for HttpTextFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(self.timeout)
                } else {
                    FetchError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}

/// Assemble the grounding context for one analysis call.
///
/// The two fetches run concurrently and are awaited jointly; ordering between
/// them is irrelevant. A fetch failure is absorbed here — logged, then
/// substituted with the fallback — so the caller always receives a usable
/// context with non-empty texts.
pub async fn assemble(fetcher: &dyn TextFetcher, cfg: &AnalysisConfig) -> AnalysisContext {
    let (guidelines, instruction) = tokio::join!(
        fetch_or_fallback(fetcher, &cfg.guidelines_url, "guidelines", FALLBACK_GUIDELINES),
        fetch_or_fallback(fetcher, &cfg.instruction_url, "instruction", FALLBACK_INSTRUCTION),
    );

    AnalysisContext {
        guidelines_text: guidelines.0,
        guidelines_loaded: guidelines.1,
        instruction_text: instruction.0,
        instruction_loaded: instruction.1,
    }
}

/// One result-or-default computation. Returns (text, loaded-from-remote).
async fn fetch_or_fallback(
    fetcher: &dyn TextFetcher,
    url: &str,
    resource: &str,
    fallback: &str,
) -> (String, bool) {
    match fetcher.fetch(url).await {
        Ok(text) if !text.trim().is_empty() => {
            tracing::info!(resource, len = text.len(), "context resource loaded");
            (text, true)
        }
        Ok(_) => {
            tracing::warn!(resource, "context resource was empty, using fallback");
            (fallback.to_string(), false)
        }
        Err(e) => {
            tracing::warn!(resource, error = %e, "context resource unavailable, using fallback");
            (fallback.to_string(), false)
        }
    }
}
