//! Backup store trait abstraction.
//!
//! Provides a trait-based abstraction for persisting [`SessionBackup`]s,
//! enabling dependency injection and mocking in tests.

use async_trait::async_trait;

use crate::backup::{BackupKey, SessionBackup};

/// Backup store operation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum BackupError {
    /// Failed to load a backup
    LoadFailed(String),
    /// Failed to save a backup
    SaveFailed(String),
    /// Failed to clear a backup
    ClearFailed(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// IO error
    Io(String),
}

impl std::fmt::Display for BackupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackupError::LoadFailed(msg) => write!(f, "Failed to load backup: {}", msg),
            BackupError::SaveFailed(msg) => write!(f, "Failed to save backup: {}", msg),
            BackupError::ClearFailed(msg) => write!(f, "Failed to clear backup: {}", msg),
            BackupError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            BackupError::Io(msg) => write!(f, "IO error: {}", msg),
        }
    }
}

impl std::error::Error for BackupError {}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        BackupError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        BackupError::Serialization(err.to_string())
    }
}

/// Durable storage for session recovery state, keyed per stream.
///
/// Concurrent writers on the same key are last-writer-wins; no merge
/// is attempted.
#[async_trait]
pub trait BackupStore: Send + Sync {
    /// Load the backup for `key`.
    ///
    /// # Returns
    /// - `Ok(Some(backup))` if one exists
    /// - `Ok(None)` if nothing is stored
    /// - `Err(error)` if loading failed
    async fn load(&self, key: &BackupKey) -> Result<Option<SessionBackup>, BackupError>;

    /// Replace the backup for `key`.
    async fn save(&self, key: &BackupKey, backup: &SessionBackup) -> Result<(), BackupError>;

    /// Delete the backup for `key`. Deleting a missing backup is not an error.
    async fn clear(&self, key: &BackupKey) -> Result<(), BackupError>;
}
