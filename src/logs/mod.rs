//! Scan activity log: entry model, deduplication and event conversion.
//!
//! # Module structure
//! - `entry` - `LogEntry`, `LogKind`, `DedupKey` and local id generation
//! - `book` - `LogBook`, the ordered deduplicated list
//! - `convert` - `ParsedEvent` to `LogEntry` conversion

mod book;
mod convert;
mod entry;

pub use book::LogBook;
pub use convert::event_to_logs;
pub use entry::{next_log_id, DedupKey, LogEntry, LogKind, DEDUP_TEXT_PREFIX};
