//! Request builder — deterministic assembly of the multimodal inference
//! request from the grounding context and the encoded image.
//!
//! The wire types mirror the OpenAI-compatible chat contract: a role-tagged
//! message list where the user message content is an array mixing a text part
//! and an image part (image given as a data URI).

use serde::Serialize;

use super::context::AnalysisContext;
use super::image::ImagePayload;
use super::RequestError;
use crate::config::AnalysisConfig;

/// Fixed task framing carried by the system role.
pub const SYSTEM_PROMPT: &str = "\
You are a wound care analysis assistant. You examine wound photographs and \
produce structured, evidence-based assessments for clinical review. Use \
Markdown: '### ' for section headings, '- ' for recommendation bullets, and \
'**bold**' for findings that need attention. Never present your output as a \
diagnosis.";

/// Clause prefixing the guidelines when the remote document loaded.
const GUIDELINES_CLAUSE: &str = "Based on these clinical guidelines:";

/// A fully assembled analysis request.
///
/// Invariants: the image is validated and present; `user_text` is non-empty
/// (the assembler's fallbacks guarantee a non-empty instruction).
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub system_text: String,
    pub user_text: String,
    pub image: ImagePayload,
}

/// Compose the request from context and image.
///
/// The guidelines clause is appended only when the remote guidelines document
/// actually loaded; the built-in fallback already reads as self-contained
/// instruction text. An empty instruction cannot happen given the assembler's
/// guarantee — the check is a defensive invariant, not an expected path.
pub fn build(context: &AnalysisContext, image: ImagePayload) -> Result<AnalysisRequest, RequestError> {
    if context.instruction_text.trim().is_empty() {
        return Err(RequestError::InvalidContext);
    }

    let mut user_text = context.instruction_text.clone();
    if context.guidelines_loaded {
        user_text.push_str("\n\n");
        user_text.push_str(GUIDELINES_CLAUSE);
        user_text.push_str("\n\n");
        user_text.push_str(&context.guidelines_text);
    }

    Ok(AnalysisRequest {
        system_text: SYSTEM_PROMPT.to_string(),
        user_text,
        image,
    })
}

// ─── Wire types ───────────────────────────────────────────────────────────────

/// Request body for the chat-completions endpoint.
#[derive(Debug, Serialize)]
pub struct ChatCompletionBody {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

/// A system message carries plain text; the user message carries mixed parts.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrlRef },
}

#[derive(Debug, Serialize)]
pub struct ImageUrlRef {
    pub url: String,
}

impl AnalysisRequest {
    /// Serialize into the provider's chat body. The image travels as an
    /// inline data URI; the credential goes in a header, never in here.
    pub fn to_body(&self, cfg: &AnalysisConfig) -> ChatCompletionBody {
        ChatCompletionBody {
            model: cfg.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: MessageContent::Text(self.system_text.clone()),
                },
                ChatMessage {
                    role: "user",
                    content: MessageContent::Parts(vec![
                        ContentPart::Text {
                            text: self.user_text.clone(),
                        },
                        ContentPart::ImageUrl {
                            image_url: ImageUrlRef {
                                url: self.image.data_uri(),
                            },
                        },
                    ]),
                },
            ],
            max_tokens: cfg.max_tokens,
            temperature: cfg.temperature,
        }
    }
}
