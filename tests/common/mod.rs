//! Common test utilities for integration tests.
//!
//! Frame builders, a session factory wired to the mock adapters, and
//! small polling helpers for paused-clock tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use scanstream::adapters::mock::{InMemoryBackupStore, MockHttpClient, RecordingHooks};
use scanstream::clock::{Clock, ManualClock, SystemClock};
use scanstream::config::{SessionConfig, StreamRequest};
use scanstream::session::{SessionSnapshot, StreamSession};
use serde_json::json;

pub const STREAM_URL: &str = "https://app.local/api/scan/42/stream";

/// Everything a session test needs a handle on.
pub struct Harness {
    pub client: MockHttpClient,
    pub backup: InMemoryBackupStore,
    pub hooks: RecordingHooks,
    pub session: StreamSession,
}

impl Harness {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_backup(config, InMemoryBackupStore::new())
    }

    pub fn with_backup(config: SessionConfig, backup: InMemoryBackupStore) -> Self {
        Self::build(config, backup, Arc::new(SystemClock))
    }

    /// Session whose log ids and stall detection read `clock`.
    pub fn with_clock(config: SessionConfig, clock: ManualClock) -> Self {
        Self::build(config, InMemoryBackupStore::new(), Arc::new(clock))
    }

    fn build(config: SessionConfig, backup: InMemoryBackupStore, clock: Arc<dyn Clock>) -> Self {
        let client = MockHttpClient::new();
        let hooks = RecordingHooks::new();
        let session = StreamSession::builder(
            Arc::new(client.clone()),
            Arc::new(backup.clone()),
            StreamRequest::get(STREAM_URL),
        )
        .hooks(Arc::new(hooks.clone()))
        .config(config)
        .clock(clock)
        .build();

        Self {
            client,
            backup,
            hooks,
            session,
        }
    }

    /// Wait until the snapshot satisfies `pred`.
    pub async fn wait_for(&self, pred: impl FnMut(&SessionSnapshot) -> bool) -> SessionSnapshot {
        let mut rx = self.session.subscribe();
        let snapshot = tokio::time::timeout(Duration::from_secs(600), rx.wait_for(pred))
            .await
            .expect("condition not reached")
            .expect("session dropped")
            .clone();
        snapshot
    }

    /// Poll until the client has seen `n` requests.
    pub async fn wait_for_requests(&self, n: usize) {
        for _ in 0..1000 {
            if self.client.request_count() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!(
            "expected {} requests, saw {}",
            n,
            self.client.request_count()
        );
    }
}

/// Small delays so paused-clock tests stay readable.
pub fn fast_config() -> SessionConfig {
    SessionConfig::default()
        .with_base_delay(Duration::from_millis(100))
        .with_max_backoff(Duration::from_secs(1))
        .with_max_retries(5)
}

/// A `text` frame carrying `id`.
pub fn text_frame(id: &str, text: &str, timestamp: f64) -> String {
    let payload = json!({
        "content": { "parts": [{ "text": text }], "role": "model" },
        "author": "scanner",
        "timestamp": timestamp,
    });
    format!("id: {}\ndata: {}\n\n", id, payload)
}

/// A `text` frame with no id, deduplicated by its composite key.
pub fn anonymous_text_frame(text: &str, timestamp: f64) -> String {
    let payload = json!({
        "content": { "parts": [{ "text": text }] },
        "author": "scanner",
        "timestamp": timestamp,
    });
    format!("data: {}\n\n", payload)
}

/// A function call frame.
pub fn call_frame(id: &str, name: &str, args: serde_json::Value) -> String {
    let payload = json!({
        "content": { "parts": [{ "functionCall": { "name": name, "args": args } }] },
        "author": "scanner",
    });
    format!("id: {}\ndata: {}\n\n", id, payload)
}
