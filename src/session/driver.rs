//! Async driver for one connection chain.
//!
//! A chain starts with `start()` or `reconnect()` and ends when the
//! controller stops asking for connections. Each chain owns a
//! generation number and a cancellation token; anything a stale chain
//! tries to write after being superseded is dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::controller::{ControlInput, Controller, Directive};
use super::health::StallMonitor;
use super::state::{ConnectionStatus, SessionSnapshot};
use crate::backup::{BackupKey, SessionBackup};
use crate::clock::Clock;
use crate::config::{SessionConfig, StreamRequest};
use crate::error::StreamError;
use crate::logs::{event_to_logs, LogBook, LogKind};
use crate::report::ReportExtractor;
use crate::sse::{decode_frame, FrameParser, SseFrame, SseParseError};
use crate::traits::{BackupStore, ByteStream, HttpClient, ResponseMeta, SessionHooks};

/// Mutable session state guarded by one lock. Never held across an await.
pub(crate) struct Inner {
    pub controller: Controller,
    pub logs: LogBook,
    pub extractor: ReportExtractor,
    pub error: Option<StreamError>,
    pub session_id: Option<String>,
    /// `on_start` already fired for this logical session.
    pub started: bool,
    pub stalled: bool,
    pub generation: u64,
    pub cancel: CancellationToken,
}

pub(crate) struct Shared {
    pub client: Arc<dyn HttpClient>,
    pub backup: Arc<dyn BackupStore>,
    pub hooks: Arc<dyn SessionHooks>,
    pub clock: Arc<dyn Clock>,
    pub config: SessionConfig,
    pub request: StreamRequest,
    pub key: BackupKey,
    inner: Mutex<Inner>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl Shared {
    pub fn new(
        client: Arc<dyn HttpClient>,
        backup: Arc<dyn BackupStore>,
        hooks: Arc<dyn SessionHooks>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
        request: StreamRequest,
        controller: Controller,
    ) -> Self {
        let inner = Inner {
            controller,
            logs: LogBook::new(),
            extractor: ReportExtractor::new(config.report_mode),
            error: None,
            session_id: None,
            started: false,
            stalled: false,
            generation: 0,
            cancel: CancellationToken::new(),
        };
        let (snapshot_tx, _) = watch::channel(snapshot_of(&inner));
        Self {
            client,
            backup,
            hooks,
            clock,
            key: BackupKey::for_url(&request.url),
            config,
            request,
            inner: Mutex::new(inner),
            snapshot_tx,
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn publish(&self, inner: &Inner) {
        self.snapshot_tx.send_replace(snapshot_of(inner));
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Supersede the current chain and hand out a fresh token.
    pub fn begin_chain(inner: &mut Inner) -> (u64, CancellationToken) {
        inner.cancel.cancel();
        inner.generation += 1;
        inner.cancel = CancellationToken::new();
        (inner.generation, inner.cancel.clone())
    }

    /// False once `stop()`, drop or a newer chain superseded `generation`.
    /// Checked right before every hook.
    fn is_current(&self, generation: u64) -> bool {
        self.lock().generation == generation
    }

    /// Publish a stall transition. No-op when the flag is unchanged.
    fn set_stalled(&self, generation: u64, stalled: bool) {
        let mut inner = self.lock();
        if inner.generation != generation || inner.stalled == stalled {
            return;
        }
        inner.stalled = stalled;
        self.publish(&inner);
    }

    /// Feed one input to the controller if `generation` is still current.
    fn apply(&self, generation: u64, input: ControlInput) -> Directive {
        let mut inner = self.lock();
        if inner.generation != generation {
            return Directive::Ignore;
        }
        let directive = inner.controller.handle(input);
        self.publish(&inner);
        directive
    }

    fn request_for(&self, resume: Option<&str>) -> StreamRequest {
        let mut request = self.request.clone();
        if let Some(id) = resume {
            request
                .headers
                .insert(self.config.resume_header.clone(), id.to_string());
        }
        request
    }

    async fn connect(
        &self,
        generation: u64,
        token: &CancellationToken,
        resume: Option<String>,
    ) -> Directive {
        let request = self.request_for(resume.as_deref());
        debug!(url = %request.url, method = request.method.as_str(), resume = ?resume, "Opening scan stream");

        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return Directive::Ignore,
            result = self.client.open_stream(&request) => result,
        };

        let response = match result {
            Ok(response) => response,
            Err(e) if e.is_cancelled() => return self.apply(generation, ControlInput::Cancelled),
            Err(e) => return self.fail(generation, StreamError::from_connect(e)),
        };

        if !response.is_success() {
            let status = response.status;
            return self.fail(
                generation,
                StreamError::Status {
                    status,
                    message: format!("unexpected status {}", status),
                },
            );
        }

        let meta = response.meta();
        let Some(body) = response.body else {
            return self.fail(generation, StreamError::NoBody);
        };

        match self.opened(generation, &meta) {
            Directive::Stream => self.read(generation, token, body).await,
            other => other,
        }
    }

    fn opened(&self, generation: u64, meta: &ResponseMeta) -> Directive {
        let first_start = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return Directive::Ignore;
            }
            let directive = inner.controller.handle(ControlInput::Opened);
            if directive != Directive::Stream {
                return directive;
            }
            inner.error = None;
            inner.stalled = false;
            if let Some(id) = meta.header(&self.config.session_id_header) {
                inner.session_id = Some(id.to_string());
            }
            let first_start = !inner.started;
            inner.started = true;
            self.publish(&inner);
            first_start
        };

        info!(status = meta.status, url = %self.request.url, "Scan stream connected");
        if first_start && self.is_current(generation) {
            self.hooks.on_start(meta);
        }
        Directive::Stream
    }

    async fn read(
        &self,
        generation: u64,
        token: &CancellationToken,
        mut body: ByteStream,
    ) -> Directive {
        let mut parser = FrameParser::new();
        let mut monitor = StallMonitor::new(self.clock.clone(), self.config.stale_after);
        let mut ticker = health_ticker(self.config.health_check_interval);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => return Directive::Ignore,
                chunk = body.next() => match chunk {
                    Some(Ok(bytes)) => {
                        for frame in parser.feed(&bytes) {
                            if !self.handle_frame(generation, frame, &mut monitor).await {
                                return Directive::Ignore;
                            }
                        }
                    }
                    Some(Err(e)) if e.is_cancelled() => {
                        return self.apply(generation, ControlInput::Cancelled);
                    }
                    Some(Err(e)) => {
                        return self.fail(generation, StreamError::Interrupted(e));
                    }
                    None => {
                        if parser.pending_len() > 0 {
                            debug!(bytes = parser.pending_len(), "Flushing unterminated trailing frame");
                        }
                        if let Some(frame) = parser.finish() {
                            if !self.handle_frame(generation, frame, &mut monitor).await {
                                return Directive::Ignore;
                            }
                        }
                        return self.complete(generation).await;
                    }
                },
                _ = next_tick(&mut ticker) => {
                    if monitor.check().is_some() {
                        self.set_stalled(generation, true);
                    }
                }
            }
        }
    }

    /// Decode, dispatch and record one frame. Returns `false` once the
    /// chain has been superseded.
    async fn handle_frame(
        &self,
        generation: u64,
        frame: SseFrame,
        monitor: &mut StallMonitor,
    ) -> bool {
        let parsed = match decode_frame(&frame) {
            Ok(parsed) => parsed,
            Err(SseParseError::EmptyPayload) => {
                // id-only keepalive: advances the cursor, logs nothing
                monitor.touch();
                self.set_stalled(generation, false);
                return match frame.id {
                    Some(id) => {
                        debug!(event_id = %id, "Keepalive frame received");
                        self.apply(generation, ControlInput::Frame { event_id: Some(id) })
                            != Directive::Ignore
                    }
                    None => true,
                };
            }
            Err(e) => {
                warn!(error = %e, "Skipping malformed frame");
                return true;
            }
        };
        monitor.touch();
        self.set_stalled(generation, false);
        debug!(event_id = ?parsed.event_id, event = ?parsed.event_name, "Frame received");

        if self.apply(
            generation,
            ControlInput::Frame {
                event_id: parsed.event_id.clone(),
            },
        ) == Directive::Ignore
        {
            return false;
        }

        if !self.is_current(generation) {
            return false;
        }
        self.hooks.on_event(&parsed);
        let entries = event_to_logs(&parsed, self.clock.as_ref());

        let backup = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return false;
            }

            let mut added = 0usize;
            for entry in entries {
                let text = (entry.kind == LogKind::Text).then(|| entry.text.clone());
                if !inner.logs.push(entry) {
                    continue;
                }
                added += 1;
                if let Some(report) = text.and_then(|t| inner.extractor.push_text(&t).map(str::len)) {
                    info!(report_len = report, "Final report extracted");
                }
            }

            if added == 0 {
                debug!(event_id = ?parsed.event_id, "Duplicate frame dropped");
                None
            } else {
                self.publish(&inner);
                Some(SessionBackup::new(
                    inner.logs.entries().to_vec(),
                    inner.controller.last_event_id().map(str::to_string),
                    self.clock.now_utc(),
                ))
            }
        };

        if let Some(backup) = backup {
            if let Err(e) = self.backup.save(&self.key, &backup).await {
                warn!(key = %self.key, error = %e, "Failed to save session backup");
            }
        }
        true
    }

    async fn complete(&self, generation: u64) -> Directive {
        let report = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return Directive::Ignore;
            }
            let directive = inner.controller.handle(ControlInput::Ended);
            if directive != Directive::Complete {
                return directive;
            }
            let report = inner.extractor.finish().map(str::to_string);
            self.publish(&inner);
            report
        };

        info!(has_report = report.is_some(), "Scan stream completed");
        if self.is_current(generation) {
            self.hooks.on_stream_end();
        }
        if self.is_current(generation) {
            self.hooks.on_complete(report.as_deref());
        }

        if let Err(e) = self.backup.clear(&self.key).await {
            warn!(key = %self.key, error = %e, "Failed to clear session backup");
        }
        Directive::Complete
    }

    fn fail(&self, generation: u64, error: StreamError) -> Directive {
        let (directive, attempt, max_retries) = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return Directive::Ignore;
            }
            let directive = inner.controller.handle(ControlInput::Failed);
            if matches!(directive, Directive::Silent | Directive::Ignore) {
                return directive;
            }
            inner.error = Some(error.clone());
            self.publish(&inner);
            (
                directive,
                inner.controller.retry_count(),
                inner.controller.max_retries(),
            )
        };

        warn!(
            code = error.error_code(),
            category = %error.category(),
            error = %error,
            "Scan stream failed"
        );
        if self.is_current(generation) {
            self.hooks.on_error(&error);
        }

        match &directive {
            Directive::Retry { delay } => {
                info!(
                    attempt,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling reconnect"
                );
            }
            Directive::GiveUp => {
                error!(attempt, max_retries, url = %self.request.url, "Giving up on scan stream");
                if self.is_current(generation) {
                    self.hooks.on_stream_end();
                }
            }
            _ => {}
        }
        directive
    }
}

/// Run a chain until the controller stops asking for connections.
pub(crate) async fn run(
    shared: Arc<Shared>,
    generation: u64,
    token: CancellationToken,
    mut directive: Directive,
) {
    loop {
        directive = match directive {
            Directive::Connect { resume } => shared.connect(generation, &token, resume).await,
            Directive::Retry { delay } => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {
                        shared.apply(generation, ControlInput::BackoffElapsed)
                    }
                }
            }
            _ => return,
        };
    }
}

fn health_ticker(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(ticker)
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn snapshot_of(inner: &Inner) -> SessionSnapshot {
    let state = inner.controller.state().clone();
    SessionSnapshot {
        logs: inner.logs.entries().to_vec(),
        connection_status: state.status(),
        is_streaming: state.is_streaming(),
        disconnect_reason: state.disconnect_reason(),
        state,
        final_report: inner.extractor.report().map(str::to_string),
        error: inner.error.clone(),
        retry_count: inner.controller.retry_count(),
        reconnect_delay: inner.controller.current_delay(),
        max_retries: inner.controller.max_retries(),
        session_id: inner.session_id.clone(),
        last_event_id: inner.controller.last_event_id().map(str::to_string),
        stalled: inner.stalled && inner.controller.state().status() == ConnectionStatus::Connected,
    }
}
