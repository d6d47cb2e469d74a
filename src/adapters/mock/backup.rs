//! In-memory backup store for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::backup::{BackupKey, SessionBackup};
use crate::traits::{BackupError, BackupStore};

/// In-memory backup store for testing.
///
/// Stores backups in a map and counts writes, allowing tests to verify
/// checkpointing without touching the file system.
///
/// # Example
///
/// ```ignore
/// use scanstream::adapters::mock::InMemoryBackupStore;
/// use scanstream::backup::BackupKey;
/// use scanstream::traits::BackupStore;
///
/// let store = InMemoryBackupStore::new();
/// let key = BackupKey::for_url("https://app.local/stream");
/// assert!(store.load(&key).await?.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackupStore {
    backups: Arc<Mutex<HashMap<BackupKey, SessionBackup>>>,
    save_count: Arc<Mutex<usize>>,
    clear_count: Arc<Mutex<usize>>,
    save_should_fail: Arc<Mutex<bool>>,
    load_should_fail: Arc<Mutex<bool>>,
}

impl InMemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one backup.
    pub fn with_backup(key: BackupKey, backup: SessionBackup) -> Self {
        let store = Self::new();
        store.set_backup(key, backup);
        store
    }

    /// Configure whether save should fail.
    pub fn set_save_should_fail(&self, should_fail: bool) {
        *self.save_should_fail.lock().unwrap() = should_fail;
    }

    /// Configure whether load should fail.
    pub fn set_load_should_fail(&self, should_fail: bool) {
        *self.load_should_fail.lock().unwrap() = should_fail;
    }

    /// Get a backup synchronously (for testing).
    pub fn get_backup(&self, key: &BackupKey) -> Option<SessionBackup> {
        self.backups.lock().unwrap().get(key).cloned()
    }

    /// Set a backup synchronously (for testing).
    pub fn set_backup(&self, key: BackupKey, backup: SessionBackup) {
        self.backups.lock().unwrap().insert(key, backup);
    }

    /// Successful saves so far.
    pub fn save_count(&self) -> usize {
        *self.save_count.lock().unwrap()
    }

    /// Clears so far, including clears of missing keys.
    pub fn clear_count(&self) -> usize {
        *self.clear_count.lock().unwrap()
    }
}

#[async_trait]
impl BackupStore for InMemoryBackupStore {
    async fn load(&self, key: &BackupKey) -> Result<Option<SessionBackup>, BackupError> {
        if *self.load_should_fail.lock().unwrap() {
            return Err(BackupError::LoadFailed("Mock load failure".to_string()));
        }
        Ok(self.get_backup(key))
    }

    async fn save(&self, key: &BackupKey, backup: &SessionBackup) -> Result<(), BackupError> {
        if *self.save_should_fail.lock().unwrap() {
            return Err(BackupError::SaveFailed("Mock save failure".to_string()));
        }
        self.set_backup(key.clone(), backup.clone());
        *self.save_count.lock().unwrap() += 1;
        Ok(())
    }

    async fn clear(&self, key: &BackupKey) -> Result<(), BackupError> {
        self.backups.lock().unwrap().remove(key);
        *self.clear_count.lock().unwrap() += 1;
        Ok(())
    }
}
