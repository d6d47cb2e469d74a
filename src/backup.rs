//! Recovery backup model.
//!
//! A [`SessionBackup`] mirrors the session's deduplicated logs and
//! resumption cursor so a restarted client can pick up an in-progress
//! scan without refetching history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::logs::LogEntry;

/// Stable storage key for one logical stream, derived from its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackupKey(String);

impl BackupKey {
    /// Hash the stream URL into a filesystem-safe key.
    pub fn for_url(url: &str) -> Self {
        let digest = Sha256::digest(url.trim().as_bytes());
        Self(format!("sse-backup-{}", &hex::encode(digest)[..32]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BackupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Durable snapshot of a session's recovery state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionBackup {
    pub logs: Vec<LogEntry>,
    pub last_event_id: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl SessionBackup {
    pub fn new(logs: Vec<LogEntry>, last_event_id: Option<String>, saved_at: DateTime<Utc>) -> Self {
        Self {
            logs,
            last_event_id,
            saved_at,
        }
    }

    /// A backup with neither logs nor a cursor seeds nothing.
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty() && self.last_event_id.is_none()
    }
}
