//! Field extraction and JSON decoding for a single frame.

use crate::sse::events::{ParsedEvent, ScanEvent, SseFrame, SseParseError};

/// Strip `name:` and at most one following space from a field line.
fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(name)?.strip_prefix(':')?;
    Some(rest.strip_prefix(' ').unwrap_or(rest))
}

/// Extract the `data:`/`id:`/`event:` fields of one frame.
///
/// Returns `None` for frames that carry nothing (blank or comment-only).
/// A frame with content but no recognised field line is taken whole as
/// the data payload, so producers that forget the `data:` prefix still
/// get through.
pub fn parse_frame(raw: &str) -> Option<SseFrame> {
    let mut frame = SseFrame::default();
    let mut data_lines: Vec<&str> = Vec::new();
    let mut saw_field = false;

    for line in raw.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        if line.starts_with(':') {
            saw_field = true;
            continue;
        }
        if let Some(value) = field_value(line, "data") {
            data_lines.push(value);
            saw_field = true;
        } else if let Some(value) = field_value(line, "id") {
            frame.id = Some(value.trim().to_string()).filter(|id| !id.is_empty());
            saw_field = true;
        } else if let Some(value) = field_value(line, "event") {
            frame.event = Some(value.trim().to_string());
            saw_field = true;
        } else if field_value(line, "retry").is_some() {
            saw_field = true;
        }
    }

    if !data_lines.is_empty() {
        frame.data = data_lines.join("\n");
        return Some(frame);
    }

    if saw_field {
        // id/event without data, or a keepalive comment
        return (frame.id.is_some() || frame.event.is_some()).then_some(frame);
    }

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    frame.data = trimmed.to_string();
    Some(frame)
}

/// Decode a frame's data payload into a `ParsedEvent`.
pub fn decode_frame(frame: &SseFrame) -> Result<ParsedEvent, SseParseError> {
    let payload = frame.data.trim();
    if payload.is_empty() {
        return Err(SseParseError::EmptyPayload);
    }

    let event: ScanEvent =
        serde_json::from_str(payload).map_err(|e| SseParseError::InvalidJson {
            payload: truncate(payload, 200),
            source: e.to_string(),
        })?;

    let event_id = frame
        .id
        .clone()
        .or_else(|| event.id.clone().filter(|id| !id.is_empty()));

    Ok(ParsedEvent {
        event_id,
        event_name: frame.event.clone(),
        event,
    })
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
