//! Resumable scan stream session.
//!
//! [`StreamSession`] owns one logical stream: it seeds itself from the
//! backup store, opens the transport, turns frames into deduplicated
//! logs, watches for the final report and reconnects with capped
//! exponential backoff. State changes are published as
//! [`SessionSnapshot`]s.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use scanstream::adapters::{FileBackupStore, ReqwestHttpClient};
//! use scanstream::config::StreamRequest;
//! use scanstream::session::StreamSession;
//!
//! let session = StreamSession::builder(
//!     Arc::new(ReqwestHttpClient::new()),
//!     Arc::new(FileBackupStore::new()?),
//!     StreamRequest::get("https://app.local/api/scan/42/stream"),
//! )
//! .build();
//!
//! session.start().await;
//! let done = session.wait_until_disconnected().await;
//! println!("{:?}", done.final_report);
//! ```

pub mod backoff;
pub mod controller;
mod driver;
pub mod health;
pub mod state;

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{info, warn};

pub use backoff::Backoff;
pub use controller::{ControlInput, Controller, Directive};
pub use health::StallMonitor;
pub use state::{ConnectionState, ConnectionStatus, DisconnectReason, SessionSnapshot};

use crate::backup::{BackupKey, SessionBackup};
use crate::clock::{Clock, SystemClock};
use crate::config::{SessionConfig, StreamRequest};
use crate::error::StreamError;
use crate::logs::{LogBook, LogEntry, LogKind};
use crate::traits::{BackupStore, HttpClient, NoopHooks, SessionHooks};
use driver::{Inner, Shared};

/// Builder for [`StreamSession`].
pub struct StreamSessionBuilder {
    client: Arc<dyn HttpClient>,
    backup: Arc<dyn BackupStore>,
    request: StreamRequest,
    hooks: Arc<dyn SessionHooks>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl StreamSessionBuilder {
    pub fn hooks(mut self, hooks: Arc<dyn SessionHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn build(self) -> StreamSession {
        let controller = Controller::new(
            self.config.max_retries,
            Backoff::new(self.config.base_delay, self.config.max_backoff),
        );
        StreamSession {
            shared: Arc::new(Shared::new(
                self.client,
                self.backup,
                self.hooks,
                self.clock,
                self.config,
                self.request,
                controller,
            )),
        }
    }
}

/// A single resumable scan stream.
///
/// Dropping the session cancels any in-flight connection and pending
/// reconnect without firing callbacks.
pub struct StreamSession {
    shared: Arc<Shared>,
}

impl StreamSession {
    pub fn builder(
        client: Arc<dyn HttpClient>,
        backup: Arc<dyn BackupStore>,
        request: StreamRequest,
    ) -> StreamSessionBuilder {
        StreamSessionBuilder {
            client,
            backup,
            request,
            hooks: Arc::new(NoopHooks),
            config: SessionConfig::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Begin a fresh logical session.
    ///
    /// Aborts any previous chain, seeds logs and the resume cursor from
    /// the backup store, then connects in the background. Returns once
    /// the connection attempt has been scheduled.
    pub async fn start(&self) {
        let (generation, token) = {
            let mut inner = self.shared.lock();
            Shared::begin_chain(&mut inner)
        };

        let seed = match self.shared.backup.load(&self.shared.key).await {
            Ok(backup) => backup.filter(|b| !b.is_empty()),
            Err(e) => {
                warn!(key = %self.shared.key, error = %e, "Failed to load session backup");
                None
            }
        };

        let directive = {
            let mut inner = self.shared.lock();
            if inner.generation != generation {
                return;
            }
            let resume = seed_from_backup(&mut inner, seed);
            inner.error = None;
            inner.session_id = None;
            inner.started = false;
            let directive = inner.controller.handle(ControlInput::Start { resume });
            self.shared.publish(&inner);
            directive
        };

        info!(url = %self.shared.request.url, "Starting scan stream");
        tokio::spawn(driver::run(
            self.shared.clone(),
            generation,
            token,
            directive,
        ));
    }

    /// Abort the transport and any pending reconnect. No callbacks fire
    /// afterwards. Logs and the backup are kept.
    pub fn stop(&self) {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        inner.cancel.cancel();
        inner.controller.handle(ControlInput::Stop);
        self.shared.publish(&inner);
        info!(url = %self.shared.request.url, "Scan stream stopped");
    }

    /// Connect again right away with a fresh retry budget, resuming from
    /// the last seen event id. Must be called from within a Tokio runtime.
    pub fn reconnect(&self) {
        let Ok(handle) = Handle::try_current() else {
            warn!("reconnect() called outside a Tokio runtime; ignoring");
            return;
        };

        let (generation, token, directive) = {
            let mut inner = self.shared.lock();
            let (generation, token) = Shared::begin_chain(&mut inner);
            let directive = inner.controller.handle(ControlInput::Reconnect);
            self.shared.publish(&inner);
            (generation, token, directive)
        };

        info!(url = %self.shared.request.url, "Manual reconnect requested");
        handle.spawn(driver::run(
            self.shared.clone(),
            generation,
            token,
            directive,
        ));
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.snapshot()
    }

    /// Receive every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.shared.subscribe()
    }

    /// Wait until the session sits in `Disconnected` for any reason.
    pub async fn wait_until_disconnected(&self) -> SessionSnapshot {
        let mut rx = self.subscribe();
        let result = rx
            .wait_for(|s| s.connection_status == ConnectionStatus::Disconnected)
            .await
            .map(|s| s.clone());
        match result {
            Ok(snapshot) => snapshot,
            Err(_) => self.snapshot(),
        }
    }

    pub fn logs(&self) -> Vec<LogEntry> {
        self.shared.lock().logs.entries().to_vec()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.shared.lock().controller.state().status()
    }

    pub fn is_streaming(&self) -> bool {
        self.shared.lock().controller.state().is_streaming()
    }

    pub fn final_report(&self) -> Option<String> {
        self.shared.lock().extractor.report().map(str::to_string)
    }

    pub fn error(&self) -> Option<StreamError> {
        self.shared.lock().error.clone()
    }

    pub fn retry_count(&self) -> u32 {
        self.shared.lock().controller.retry_count()
    }

    pub fn reconnect_delay(&self) -> Duration {
        self.shared.lock().controller.current_delay()
    }

    pub fn max_retries(&self) -> u32 {
        self.shared.config.max_retries
    }

    pub fn request(&self) -> &StreamRequest {
        &self.shared.request
    }

    pub fn backup_key(&self) -> &BackupKey {
        &self.shared.key
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        let mut inner = self.shared.lock();
        inner.generation += 1;
        inner.cancel.cancel();
    }
}

/// Replace logs and report text with the backup's, or clear them for a
/// fresh session. Returns the resume cursor.
fn seed_from_backup(inner: &mut Inner, seed: Option<SessionBackup>) -> Option<String> {
    inner.extractor.reset();
    let Some(backup) = seed else {
        inner.logs.clear();
        return None;
    };

    info!(
        logs = backup.logs.len(),
        last_event_id = ?backup.last_event_id,
        "Restored session from backup"
    );
    let resume = backup.last_event_id.clone();
    inner.logs = LogBook::from_entries(backup.logs);
    for entry in inner.logs.entries() {
        if entry.kind == LogKind::Text {
            inner.extractor.push_text(&entry.text);
        }
    }
    resume
}
