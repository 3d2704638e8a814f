//! Interaction logging interface.
//!
//! Lifecycle events (start / complete / error) are handed to an external
//! collaborator keyed by a caller-supplied session identifier. The pipeline
//! never blocks on the sink: `record` implementations must return
//! immediately, and a lost event is acceptable.

use serde::Serialize;

/// Feature label attached to every analysis event.
pub const ANALYSIS_FEATURE: &str = "wound_analysis";

/// Generate a fresh session identifier for a caller that has none.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Start,
    Complete,
    Error,
}

/// One lifecycle event, as handed to the external collaborator.
#[derive(Debug, Clone, Serialize)]
pub struct InteractionEvent {
    pub session_id: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub feature: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl InteractionEvent {
    pub fn start(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            kind: EventKind::Start,
            feature: ANALYSIS_FEATURE,
            error_message: None,
        }
    }

    pub fn complete(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            kind: EventKind::Complete,
            feature: ANALYSIS_FEATURE,
            error_message: None,
        }
    }

    pub fn error(session_id: &str, message: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            kind: EventKind::Error,
            feature: ANALYSIS_FEATURE,
            error_message: Some(message.to_string()),
        }
    }
}

/// Fire-and-forget event sink. Implementations must not block.
pub trait InteractionSink: Send + Sync {
    fn record(&self, event: InteractionEvent);
}

/// Default sink — emits the event into the tracing stream.
pub struct TracingSink;

impl InteractionSink for TracingSink {
    fn record(&self, event: InteractionEvent) {
        tracing::info!(
            session_id = %event.session_id,
            kind = ?event.kind,
            feature = event.feature,
            error = event.error_message.as_deref().unwrap_or(""),
            "interaction event"
        );
    }
}

/// Test sink capturing events in memory.
pub struct MemorySink {
    events: std::sync::Mutex<Vec<InteractionEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<InteractionEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionSink for MemorySink {
    fn record(&self, event: InteractionEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
