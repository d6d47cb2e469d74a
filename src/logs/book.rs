//! Append-only, deduplicated log list.

use std::collections::HashSet;

use crate::logs::entry::{DedupKey, LogEntry};

/// Ordered log entries with insert-time deduplication.
///
/// The first occurrence of a [`DedupKey`] wins; later duplicates are
/// dropped silently. Insertion order is preserved, so entries from a
/// resumed connection land after everything already present.
#[derive(Debug, Clone, Default)]
pub struct LogBook {
    entries: Vec<LogEntry>,
    seen: HashSet<DedupKey>,
}

impl LogBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from a backup. Duplicates inside the backup are dropped too.
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        let mut book = Self::new();
        for entry in entries {
            book.push(entry);
        }
        book
    }

    /// Append an entry. Returns `false` if it was a duplicate.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        if !self.seen.insert(entry.dedup_key()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.seen.clear();
    }
}
