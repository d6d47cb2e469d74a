//! SSE (Server-Sent Events) frame parsing for the scan worker stream.
//!
//! The worker sends frames of the form:
//! - `id: <token>` - optional resumption id
//! - `event: <type>` - optional event name
//! - `data: <json>` - the event payload
//! - Empty line - ends the frame
//! - Lines starting with `:` - comments (ignored)
//!
//! # Module structure
//! - `events` - Frame and event types (`SseFrame`, `ScanEvent`, `Part`)
//! - `parser` - Chunk buffering, field extraction and JSON decoding

mod events;
mod parser;

pub use events::{
    Content, FunctionCall, FunctionResponse, ParsedEvent, Part, ScanEvent, SseFrame,
    SseParseError,
};
pub use parser::{decode_frame, parse_frame, FrameParser};
