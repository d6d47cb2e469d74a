//! Log entry model and identity.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::clock::Clock;

/// Number of text characters that go into the composite dedup key.
pub const DEDUP_TEXT_PREFIX: usize = 100;

static LOG_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a local log id: `log-<millis>-<counter>`.
///
/// The counter is process-wide, so ids are never reused within a process
/// and the timestamp keeps them apart across restarts.
pub fn next_log_id(clock: &dyn Clock) -> String {
    let seq = LOG_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("log-{}-{}", clock.now_millis(), seq)
}

/// What kind of activity a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LogKind {
    Text,
    FunctionCall,
    FunctionResponse,
    Notification,
}

/// One observed unit of agent activity. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Local id, unique per entry
    pub id: String,
    /// Stream-assigned id, used for dedup and resumption
    #[serde(default)]
    pub event_id: Option<String>,
    /// Epoch seconds as reported by the source
    #[serde(default)]
    pub timestamp: Option<f64>,
    pub author: String,
    pub kind: LogKind,
    pub text: String,
}

impl LogEntry {
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::for_entry(self)
    }
}

/// Identity used to drop replayed events.
///
/// `Event` is exact: the stream guarantees ids are unique. `Composite` is
/// the fallback for frames without an id and is weaker: two distinct
/// events with the same timestamp, author and first
/// [`DEDUP_TEXT_PREFIX`] characters collapse into one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DedupKey {
    Event(String),
    Composite {
        timestamp_bits: Option<u64>,
        author: String,
        text_prefix: String,
    },
}

impl DedupKey {
    pub fn for_entry(entry: &LogEntry) -> Self {
        match &entry.event_id {
            Some(id) => DedupKey::Event(id.clone()),
            None => Self::composite(entry.timestamp, &entry.author, &entry.text),
        }
    }

    pub fn composite(timestamp: Option<f64>, author: &str, text: &str) -> Self {
        DedupKey::Composite {
            timestamp_bits: timestamp.map(f64::to_bits),
            author: author.to_string(),
            text_prefix: text.chars().take(DEDUP_TEXT_PREFIX).collect(),
        }
    }
}
