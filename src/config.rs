//! Process-wide configuration for the analysis pipeline.
//!
//! Everything here is resolved once at startup. The inference credential is
//! the only secret; it is read from the environment and never logged.

use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "Woundsight";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding the inference endpoint credential.
pub const CREDENTIAL_ENV_VAR: &str = "OPENAI_API_KEY";

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    format!("{}=info", env!("CARGO_PKG_NAME"))
}

/// Bearer token for the inference endpoint.
///
/// Wrapped so the secret cannot leak through `Debug` formatting or a
/// tracing field. Read-only for the process lifetime.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Read the credential from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CREDENTIAL_ENV_VAR) {
            Ok(token) if !token.trim().is_empty() => Ok(Self(token)),
            _ => Err(ConfigError::MissingCredential),
        }
    }

    /// The raw token, for building the Authorization header only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(redacted)")
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("{CREDENTIAL_ENV_VAR} is not set")]
    MissingCredential,
}

/// Settings for one analysis pipeline instance.
///
/// The two context resource URLs point at plain UTF-8 text files; both
/// tolerate absence (the assembler degrades to built-in fallbacks).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Chat-completions endpoint of the vision model provider.
    pub endpoint: String,
    /// Model identifier sent in the request body.
    pub model: String,
    /// Clinical guidelines text resource.
    pub guidelines_url: String,
    /// Instruction template text resource.
    pub instruction_url: String,
    /// Timeout for each context resource fetch.
    pub fetch_timeout: Duration,
    /// Timeout for the inference call. Dropping the call future cancels it
    /// through the same mechanism.
    pub inference_timeout: Duration,
    /// Token budget for the model's answer.
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".into(),
            model: "gpt-4o-mini".into(),
            guidelines_url: "https://wounds.nextstepcare.com.au/guidelines.txt".into(),
            instruction_url: "https://wounds.nextstepcare.com.au/prompt.txt".into(),
            fetch_timeout: Duration::from_secs(10),
            inference_timeout: Duration::from_secs(60),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }
}
