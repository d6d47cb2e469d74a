//! SSE frame and scan event types
//!
//! `SseFrame` is the raw field view of one blank-line-delimited frame.
//! `ScanEvent` is the JSON payload the scan worker puts in `data:`.

use serde::{Deserialize, Serialize};

/// A single frame split out of the byte stream, before JSON decoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    /// Value of the `id:` field, if present
    pub id: Option<String>,
    /// Value of the `event:` field, if present
    pub event: Option<String>,
    /// Data payload (multiple `data:` lines joined with `\n`)
    pub data: String,
}

/// Function invocation requested by the agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Value>,
}

/// Result returned to the agent from a function invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<serde_json::Value>,
}

/// One part of an event's content.
///
/// Unknown part shapes are kept as raw JSON so a new part kind on the
/// worker side does not make the whole event undecodable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: FunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: FunctionResponse,
    },
    Other(serde_json::Value),
}

/// Event content wrapper.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Typed event emitted by the scan worker.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScanEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Epoch seconds as reported by the worker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ScanEvent {
    /// Parts carried by this event, empty when there is no content.
    pub fn parts(&self) -> &[Part] {
        self.content
            .as_ref()
            .map(|c| c.parts.as_slice())
            .unwrap_or(&[])
    }

    /// True for part-less events that still carry a `type` or `role`.
    pub fn is_notification(&self) -> bool {
        self.parts().is_empty() && (self.event_type.is_some() || self.role.is_some())
    }
}

/// A decoded frame: the event plus the stream-level id that carried it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEvent {
    /// Resumption id: the frame's `id:` field, else the payload's `id`
    pub event_id: Option<String>,
    /// The frame's `event:` field
    pub event_name: Option<String>,
    pub event: ScanEvent,
}

/// Errors decoding a single frame. Never fatal to the stream.
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// Data payload was not valid JSON for a `ScanEvent`
    InvalidJson { payload: String, source: String },
    /// Frame had nothing to decode
    EmptyPayload,
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::InvalidJson { payload, source } => {
                write!(f, "Invalid JSON in frame '{}': {}", payload, source)
            }
            SseParseError::EmptyPayload => write!(f, "Frame has no data payload"),
        }
    }
}

impl std::error::Error for SseParseError {}
