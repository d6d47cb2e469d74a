//! Convert decoded scan events into log entries.

use crate::clock::Clock;
use crate::logs::entry::{next_log_id, LogEntry, LogKind};
use crate::sse::{ParsedEvent, Part};

const DEFAULT_AUTHOR: &str = "agent";

/// Build the log entries for one event.
///
/// Each recognised part becomes one entry. An event id shared by several
/// parts is suffixed `#<index>` from the second part on, so every entry
/// keeps a distinct event id. Part-less events with a `type` or `role`
/// become a single notification carrying the full JSON.
pub fn event_to_logs(parsed: &ParsedEvent, clock: &dyn Clock) -> Vec<LogEntry> {
    let event = &parsed.event;
    let author = event
        .author
        .clone()
        .or_else(|| event.content.as_ref().and_then(|c| c.role.clone()))
        .or_else(|| event.role.clone())
        .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

    if event.is_notification() {
        let text = serde_json::to_string(event).unwrap_or_default();
        return vec![LogEntry {
            id: next_log_id(clock),
            event_id: parsed.event_id.clone(),
            timestamp: event.timestamp,
            author,
            kind: LogKind::Notification,
            text,
        }];
    }

    let mut entries = Vec::new();
    for part in event.parts() {
        let (kind, text) = match part {
            Part::Text { text } => (LogKind::Text, text.clone()),
            Part::FunctionCall { function_call } => {
                let args = function_call
                    .args
                    .as_ref()
                    .map(|a| a.to_string())
                    .unwrap_or_else(|| "{}".to_string());
                (
                    LogKind::FunctionCall,
                    format!("{}({})", function_call.name, args),
                )
            }
            Part::FunctionResponse { function_response } => {
                let body = function_response
                    .response
                    .as_ref()
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "null".to_string());
                (
                    LogKind::FunctionResponse,
                    format!("{} -> {}", function_response.name, body),
                )
            }
            Part::Other(_) => continue,
        };

        let event_id = parsed.event_id.as_ref().map(|id| match entries.len() {
            0 => id.clone(),
            n => format!("{}#{}", id, n),
        });

        entries.push(LogEntry {
            id: next_log_id(clock),
            event_id,
            timestamp: event.timestamp,
            author: author.clone(),
            kind,
            text,
        });
    }
    entries
}
