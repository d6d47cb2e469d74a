//! File-based backup store adapter.
//!
//! One JSON file per [`BackupKey`] under the local data directory
//! (`<data_local_dir>/scanstream/backups/<key>.json`). Writes go to a
//! temporary file first and are renamed into place so a crash never
//! leaves a half-written backup behind.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::backup::{BackupKey, SessionBackup};
use crate::traits::{BackupError, BackupStore};

const APP_DIR: &str = "scanstream";
const BACKUP_DIR: &str = "backups";

/// File-based backup store.
///
/// # Example
///
/// ```ignore
/// use scanstream::adapters::FileBackupStore;
/// use scanstream::backup::BackupKey;
/// use scanstream::traits::BackupStore;
///
/// let store = FileBackupStore::new()?;
/// let key = BackupKey::for_url("https://app.local/api/scan/42/stream");
/// if let Some(backup) = store.load(&key).await? {
///     println!("{} logs saved at {}", backup.logs.len(), backup.saved_at);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileBackupStore {
    dir: PathBuf,
}

impl FileBackupStore {
    /// Store under the platform's local data directory.
    ///
    /// # Returns
    /// The store, or an error if the data directory cannot be determined.
    pub fn new() -> Result<Self, BackupError> {
        dirs::data_local_dir()
            .map(|base| Self::with_dir(base.join(APP_DIR).join(BACKUP_DIR)))
            .ok_or_else(|| {
                BackupError::Io("Failed to determine local data directory".to_string())
            })
    }

    /// Store under an explicit directory.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &BackupKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl BackupStore for FileBackupStore {
    async fn load(&self, key: &BackupKey) -> Result<Option<SessionBackup>, BackupError> {
        let path = self.path_for(key);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackupError::LoadFailed(format!("{}: {}", path.display(), e))),
        };
        let backup = serde_json::from_slice(&bytes)?;
        Ok(Some(backup))
    }

    async fn save(&self, key: &BackupKey, backup: &SessionBackup) -> Result<(), BackupError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_vec(backup)?;

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| BackupError::SaveFailed(format!("{}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| BackupError::SaveFailed(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    async fn clear(&self, key: &BackupKey) -> Result<(), BackupError> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackupError::ClearFailed(format!("{}: {}", path.display(), e))),
        }
    }
}
