use super::thread::Confidence;
use serde::Deserialize;

/// One decoded `data:` payload from the query stream.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamEvent {
    /// Backend stage that emitted the event, e.g. `supervisor`.
    #[serde(default)]
    pub node: Option<String>,
    #[serde(default)]
    pub data: Option<StreamPayload>,
    /// Set when the backend graph failed while streaming.
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamPayload {
    #[serde(default)]
    pub route: Option<String>,
    /// Cumulative assistant text so far, not a delta.
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub confidence: Option<Confidence>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SseFrame {
    Event(StreamEvent),
    /// The literal `[DONE]` sentinel.
    Done,
}
