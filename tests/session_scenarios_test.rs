//! End-to-end session behavior against the scripted mock transport.
//!
//! Every test runs on a paused clock, so backoff sleeps resolve instantly
//! while keeping their ordering.

mod common;

use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use common::*;
use scanstream::adapters::mock::{
    HookCall, InMemoryBackupStore, MockHttpClient, MockResponse, RecordingHooks,
};
use scanstream::backup::{BackupKey, SessionBackup};
use scanstream::clock::ManualClock;
use scanstream::config::{SessionConfig, StreamRequest};
use scanstream::error::StreamError;
use scanstream::logs::{LogEntry, LogKind};
use scanstream::report::ReportMode;
use scanstream::session::{ConnectionStatus, DisconnectReason, StreamSession};
use scanstream::sse::ParsedEvent;
use scanstream::traits::{HttpError, ResponseMeta, SessionHooks};

fn io_error() -> HttpError {
    HttpError::Io("connection reset by peer".to_string())
}

#[tokio::test(start_paused = true)]
async fn test_clean_short_scan_completes_with_report() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([
        text_frame("e1", "Starting blackbox assessment", 1.0),
        text_frame("e2", "===BLACKBOX_REPORT_START===\nHello", 2.0),
        text_frame("e3", "\n===BLACKBOX_REPORT_END===", 3.0),
    ])));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(snapshot.logs.len(), 3);
    assert_eq!(snapshot.final_report.as_deref(), Some("Hello"));
    assert_eq!(snapshot.disconnect_reason, Some(DisconnectReason::Completed));
    assert!(!snapshot.is_streaming);
    assert!(snapshot.error.is_none());

    assert_eq!(h.hooks.completions(), vec![Some("Hello".to_string())]);
    assert_eq!(h.hooks.starts(), 1);
    let calls = h.hooks.calls();
    let end = calls.iter().position(|c| *c == HookCall::StreamEnd).unwrap();
    let complete = calls
        .iter()
        .position(|c| matches!(c, HookCall::Complete(_)))
        .unwrap();
    assert!(end < complete, "on_stream_end must precede on_complete");

    // Backup cleared on natural end
    assert!(h.backup.get_backup(h.session.backup_key()).is_none());
    assert_eq!(h.backup.clear_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_markers_leaves_report_empty() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([
        text_frame("e1", "Scanning ports", 1.0),
        text_frame("e2", "Nothing interesting found", 2.0),
    ])));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(snapshot.final_report, None);
    assert_eq!(h.hooks.completions(), vec![None]);
}

#[tokio::test(start_paused = true)]
async fn test_report_markers_split_across_chunks_and_parts() {
    let h = Harness::new(fast_config().with_report_mode(ReportMode::Whitebox));
    let body = [
        text_frame("e1", "===WHITEBOX_REP", 1.0),
        text_frame("e2", "ORT_START===\n  Finding: SQLi in /login  \n===WHITE", 2.0),
        text_frame("e3", "BOX_REPORT_END=== trailing", 3.0),
    ]
    .concat();
    // Re-chunk at awkward byte offsets
    let bytes = body.into_bytes();
    let chunks: Vec<Bytes> = bytes
        .chunks(7)
        .map(|c| Bytes::copy_from_slice(c))
        .collect();
    h.client.push_response(MockResponse::Stream(chunks));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(
        snapshot.final_report.as_deref(),
        Some("Finding: SQLi in /login")
    );
    assert_eq!(snapshot.logs.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_flaky_network_recovers_without_duplicates() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::StreamThenError(
        MockResponse::chunks([text_frame("e1", "phase one", 1.0)]),
        io_error(),
    ));
    h.client.push_response(MockResponse::StreamThenError(
        MockResponse::chunks([
            text_frame("e1", "phase one", 1.0),
            text_frame("e2", "phase two", 2.0),
        ]),
        io_error(),
    ));
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([
        text_frame("e2", "phase two", 2.0),
        text_frame("e3", "phase three", 3.0),
    ])));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    let texts: Vec<&str> = snapshot.logs.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["phase one", "phase two", "phase three"]);
    assert_eq!(snapshot.retry_count, 0);
    assert_eq!(snapshot.reconnect_delay, Duration::ZERO);
    assert_eq!(snapshot.disconnect_reason, Some(DisconnectReason::Completed));

    assert_eq!(h.client.request_count(), 3);
    assert_eq!(h.hooks.errors().len(), 2);
    assert_eq!(h.hooks.starts(), 1, "on_start fires once per logical session");
    assert_eq!(h.hooks.stream_ends(), 1);
    // Every frame reaches on_event, replays included
    assert_eq!(h.hooks.event_ids().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_sends_last_event_id() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::StreamThenError(
        MockResponse::chunks([
            text_frame("e1", "one", 1.0),
            text_frame("e2", "two", 2.0),
            text_frame("e3", "three", 3.0),
        ]),
        io_error(),
    ));
    h.client.push_response(MockResponse::Stream(Vec::new()));

    h.session.start().await;
    h.session.wait_until_disconnected().await;

    let requests = h.client.get_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].header("Last-Event-ID"), None);
    assert_eq!(requests[1].header("Last-Event-ID"), Some("e3"));
}

#[tokio::test(start_paused = true)]
async fn test_id_only_frame_advances_resume_cursor() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::StreamThenError(
        MockResponse::chunks([text_frame("e1", "one", 1.0), "id: e2\n\n".to_string()]),
        io_error(),
    ));
    h.client.push_response(MockResponse::Stream(Vec::new()));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    let requests = h.client.get_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].header("Last-Event-ID"), Some("e2"));
    assert_eq!(snapshot.last_event_id.as_deref(), Some("e2"));
    // Keepalives carry no content
    assert_eq!(snapshot.logs.len(), 1);
    assert_eq!(h.hooks.event_ids(), vec![Some("e1".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn test_retry_budget_exhausts() {
    let h = Harness::new(fast_config().with_max_retries(3));
    for _ in 0..3 {
        h.client.push_response(MockResponse::Error(HttpError::ConnectionFailed(
            "refused".to_string(),
        )));
    }

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(snapshot.connection_status, ConnectionStatus::Disconnected);
    assert_eq!(
        snapshot.disconnect_reason,
        Some(DisconnectReason::RetriesExhausted)
    );
    assert!(snapshot.gave_up());
    assert_eq!(snapshot.retry_count, 3);
    assert_eq!(snapshot.max_retries, 3);
    assert!(matches!(snapshot.error, Some(StreamError::Connect(_))));
    assert_eq!(h.hooks.errors().len(), 3);
    assert_eq!(h.hooks.stream_ends(), 1);
    assert!(h.hooks.completions().is_empty());

    // Nothing else is scheduled
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(h.client.request_count(), 3);
    assert_eq!(
        h.session.connection_status(),
        ConnectionStatus::Disconnected
    );
}

#[tokio::test(start_paused = true)]
async fn test_backoff_delays_double_and_cap() {
    let config = fast_config()
        .with_base_delay(Duration::from_millis(100))
        .with_max_backoff(Duration::from_millis(300))
        .with_max_retries(10);
    let h = Harness::new(config);
    for _ in 0..4 {
        h.client.push_response(MockResponse::Error(HttpError::Timeout("slow".to_string())));
    }
    h.client.push_response(MockResponse::Pending);

    let started = tokio::time::Instant::now();
    h.session.start().await;
    h.wait_for_requests(5).await;

    // 100 + 200 + 300 + 300
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(900), "elapsed {:?}", elapsed);
    assert!(elapsed < Duration::from_millis(1000), "elapsed {:?}", elapsed);
    assert_eq!(h.session.retry_count(), 4);
    assert_eq!(h.session.connection_status(), ConnectionStatus::Connecting);

    h.session.stop();
}

#[tokio::test(start_paused = true)]
async fn test_reconnecting_state_exposes_attempt_and_delay() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Error(io_error()));
    h.client.push_response(MockResponse::Pending);

    h.session.start().await;
    let snapshot = h
        .wait_for(|s| s.connection_status == ConnectionStatus::Reconnecting)
        .await;

    assert!(snapshot.is_streaming);
    assert_eq!(snapshot.retry_count, 1);
    assert_eq!(snapshot.reconnect_delay, Duration::from_millis(100));
    assert!(matches!(snapshot.error, Some(StreamError::Interrupted(_)) | Some(StreamError::Connect(_))));

    h.session.stop();
}

#[tokio::test(start_paused = true)]
async fn test_manual_reconnect_after_giving_up() {
    let h = Harness::new(fast_config().with_max_retries(1));
    h.client.push_response(MockResponse::Error(io_error()));
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([text_frame(
        "e1", "back", 1.0,
    )])));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;
    assert!(snapshot.gave_up());

    h.session.reconnect();
    let snapshot = h
        .wait_for(|s| s.disconnect_reason == Some(DisconnectReason::Completed))
        .await;
    assert_eq!(snapshot.logs.len(), 1);
    assert_eq!(snapshot.retry_count, 0);
    assert!(snapshot.error.is_none());
    assert_eq!(h.client.request_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stop_in_flight_is_silent() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Pending);

    h.session.start().await;
    h.wait_for_requests(1).await;
    h.session.stop();

    let snapshot = h.session.snapshot();
    assert_eq!(snapshot.connection_status, ConnectionStatus::Disconnected);
    assert_eq!(snapshot.disconnect_reason, Some(DisconnectReason::Stopped));
    assert!(!snapshot.is_streaming);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.client.request_count(), 1);
    assert!(h.hooks.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_backoff_cancels_timer() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Error(io_error()));

    h.session.start().await;
    h.wait_for(|s| s.connection_status == ConnectionStatus::Reconnecting)
        .await;
    h.session.stop();

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(h.client.request_count(), 1);
    assert_eq!(h.session.reconnect_delay(), Duration::ZERO);
    assert_eq!(h.hooks.errors().len(), 1);
    assert_eq!(h.hooks.stream_ends(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stop_mid_stream_keeps_logs_and_backup() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::StreamThenHang(MockResponse::chunks([
        text_frame("e1", "one", 1.0),
        text_frame("e2", "two", 2.0),
    ])));

    h.session.start().await;
    h.wait_for(|s| s.logs.len() == 2).await;
    h.session.stop();

    assert_eq!(h.session.logs().len(), 2);
    let backup = h.backup.get_backup(h.session.backup_key()).unwrap();
    assert_eq!(backup.logs.len(), 2);
    assert_eq!(backup.last_event_id.as_deref(), Some("e2"));
    assert_eq!(h.backup.clear_count(), 0);
    assert_eq!(h.hooks.stream_ends(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transport_cancellation_is_silent() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Error(HttpError::Cancelled));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(snapshot.disconnect_reason, Some(DisconnectReason::Stopped));
    assert!(snapshot.error.is_none());
    assert!(h.hooks.errors().is_empty());
    assert_eq!(h.client.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_drop_tears_down_silently() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Pending);

    h.session.start().await;
    h.wait_for_requests(1).await;

    let Harness {
        client,
        hooks,
        session,
        ..
    } = h;
    drop(session);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(client.request_count(), 1);
    assert!(hooks.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_event_ids_are_dropped() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([
        text_frame("e1", "first", 1.0),
        text_frame("e1", "first again", 1.5),
        anonymous_text_frame("no id", 2.0),
        anonymous_text_frame("no id", 2.0),
    ])));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    let texts: Vec<&str> = snapshot.logs.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "no id"]);
}

#[tokio::test(start_paused = true)]
async fn test_malformed_frames_are_skipped() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([
        text_frame("e1", "before", 1.0),
        "data: {not json at all\n\n".to_string(),
        text_frame("e2", "after", 2.0),
    ])));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(snapshot.logs.len(), 2);
    assert!(h.hooks.errors().is_empty());
    assert_eq!(snapshot.disconnect_reason, Some(DisconnectReason::Completed));
}

#[tokio::test(start_paused = true)]
async fn test_notifications_and_function_calls_are_logged() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([
        call_frame("e1", "run_nmap", serde_json::json!({"target": "10.0.0.5"})),
        "id: e2\ndata: {\"type\":\"heartbeat\",\"role\":\"system\"}\n\n".to_string(),
    ])));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(snapshot.logs.len(), 2);
    assert_eq!(snapshot.logs[0].kind, LogKind::FunctionCall);
    assert_eq!(snapshot.logs[0].text, r#"run_nmap({"target":"10.0.0.5"})"#);
    assert_eq!(snapshot.logs[1].kind, LogKind::Notification);
    assert!(snapshot.logs[1].text.contains("heartbeat"));
}

#[tokio::test(start_paused = true)]
async fn test_trailing_frame_without_blank_line_is_flushed() {
    let h = Harness::new(fast_config());
    let last = text_frame("e2", "tail", 2.0);
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([
        text_frame("e1", "head", 1.0),
        last.trim_end().to_string(),
    ])));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(snapshot.logs.len(), 2);
    assert_eq!(snapshot.last_event_id.as_deref(), Some("e2"));
}

#[tokio::test(start_paused = true)]
async fn test_no_body_and_bad_status_are_retried() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::NoBody);
    h.client.push_response(MockResponse::Error(HttpError::ServerError {
        status: 503,
        message: "Service Unavailable".to_string(),
    }));
    h.client.push_response(MockResponse::Stream(Vec::new()));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(
        h.hooks.errors(),
        vec![
            StreamError::NoBody,
            StreamError::Status {
                status: 503,
                message: "Service Unavailable".to_string()
            }
        ]
    );
    assert_eq!(snapshot.disconnect_reason, Some(DisconnectReason::Completed));
}

#[tokio::test(start_paused = true)]
async fn test_session_id_captured_on_start() {
    let h = Harness::new(fast_config());
    h.client.set_response_header("X-Session-ID", "sess-1234");
    h.client.push_response(MockResponse::Stream(Vec::new()));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(snapshot.session_id.as_deref(), Some("sess-1234"));
    let Some(HookCall::Start(meta)) = h.hooks.calls().into_iter().next() else {
        panic!("first callback should be on_start");
    };
    assert_eq!(meta.status, 200);
    assert_eq!(meta.header("x-session-id"), Some("sess-1234"));
}

fn seeded_entry(id: &str, event_id: &str, text: &str, timestamp: f64) -> LogEntry {
    LogEntry {
        id: id.to_string(),
        event_id: Some(event_id.to_string()),
        timestamp: Some(timestamp),
        author: "scanner".to_string(),
        kind: LogKind::Text,
        text: text.to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_cold_start_resumes_from_backup() {
    let key = BackupKey::for_url(STREAM_URL);
    let backup = InMemoryBackupStore::with_backup(
        key,
        SessionBackup::new(
            vec![
                seeded_entry("log-1-0", "e1", "one", 1.0),
                seeded_entry("log-1-1", "e2", "two", 2.0),
            ],
            Some("e2".to_string()),
            Utc::now(),
        ),
    );
    let h = Harness::with_backup(fast_config(), backup);
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([
        text_frame("e2", "two", 2.0),
        text_frame("e3", "three", 3.0),
    ])));

    h.session.start().await;
    // Seeded before any network activity
    assert_eq!(h.session.logs().len(), 2);

    let snapshot = h.session.wait_until_disconnected().await;
    let texts: Vec<&str> = snapshot.logs.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, vec!["one", "two", "three"]);
    assert_eq!(
        h.client.get_requests()[0].header("Last-Event-ID"),
        Some("e2")
    );
}

#[tokio::test(start_paused = true)]
async fn test_backup_report_text_carries_over() {
    let key = BackupKey::for_url(STREAM_URL);
    let backup = InMemoryBackupStore::with_backup(
        key,
        SessionBackup::new(
            vec![seeded_entry("log-1-0", "e1", "===BLACKBOX_REPORT_START===\nRecovered", 1.0)],
            Some("e1".to_string()),
            Utc::now(),
        ),
    );
    let h = Harness::with_backup(fast_config(), backup);
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([text_frame(
        "e2",
        "\n===BLACKBOX_REPORT_END===",
        2.0,
    )])));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;
    assert_eq!(snapshot.final_report.as_deref(), Some("Recovered"));
}

#[tokio::test(start_paused = true)]
async fn test_backup_written_after_each_accepted_append() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([
        text_frame("e1", "one", 1.0),
        text_frame("e1", "one", 1.0),
        text_frame("e2", "two", 2.0),
    ])));

    h.session.start().await;
    h.session.wait_until_disconnected().await;

    // Duplicate frame triggers no write
    assert_eq!(h.backup.save_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_backup_failures_do_not_stop_the_stream() {
    let h = Harness::new(fast_config());
    h.backup.set_load_should_fail(true);
    h.backup.set_save_should_fail(true);
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([text_frame(
        "e1", "one", 1.0,
    )])));

    h.session.start().await;
    let snapshot = h.session.wait_until_disconnected().await;

    assert_eq!(snapshot.logs.len(), 1);
    assert!(h.hooks.errors().is_empty());
    assert_eq!(snapshot.disconnect_reason, Some(DisconnectReason::Completed));
}

#[tokio::test(start_paused = true)]
async fn test_fresh_start_clears_previous_logs() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([text_frame(
        "e1", "first run", 1.0,
    )])));
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([text_frame(
        "f1", "second run", 5.0,
    )])));

    h.session.start().await;
    let first = h.session.wait_until_disconnected().await;
    assert_eq!(first.logs.len(), 1);

    h.session.start().await;
    let second = h
        .wait_for(|s| {
            s.disconnect_reason == Some(DisconnectReason::Completed)
                && s.logs.first().map(|l| l.text.as_str()) == Some("second run")
        })
        .await;
    assert_eq!(second.logs.len(), 1);
    assert_eq!(h.client.get_requests()[1].header("Last-Event-ID"), None);
    assert_eq!(h.hooks.starts(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_restart_aborts_previous_chain() {
    let h = Harness::new(fast_config());
    h.client.push_response(MockResponse::Pending);
    h.client.push_response(MockResponse::Stream(MockResponse::chunks([text_frame(
        "e1", "only", 1.0,
    )])));

    h.session.start().await;
    h.wait_for_requests(1).await;
    h.session.start().await;

    let snapshot = h.session.wait_until_disconnected().await;
    assert_eq!(snapshot.logs.len(), 1);
    assert_eq!(h.hooks.completions().len(), 1);
    assert!(h.hooks.errors().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_silent_stream_is_flagged_stale_but_kept_open() {
    let clock = ManualClock::default();
    let config = fast_config()
        .with_health_check_interval(Duration::from_secs(1))
        .with_stale_after(Duration::from_secs(5));
    let h = Harness::with_clock(config, clock.clone());
    h.client.push_response(MockResponse::StreamThenHang(MockResponse::chunks([
        text_frame("e1", "alive", 1.0),
    ])));

    h.session.start().await;
    h.wait_for(|s| s.logs.len() == 1).await;

    // Under the threshold: several checks run, nothing is flagged
    clock.advance(Duration::from_secs(3));
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!h.session.snapshot().stalled);

    clock.advance(Duration::from_secs(10));
    let snapshot = h.wait_for(|s| s.stalled).await;
    assert_eq!(snapshot.connection_status, ConnectionStatus::Connected);

    // Stays connected on the same transport; no reconnect, no error
    tokio::time::sleep(Duration::from_secs(30)).await;
    let snapshot = h.session.snapshot();
    assert!(snapshot.stalled);
    assert_eq!(snapshot.connection_status, ConnectionStatus::Connected);
    assert_eq!(snapshot.retry_count, 0);
    assert_eq!(h.client.request_count(), 1);
    assert!(h.hooks.errors().is_empty());

    h.session.stop();
    assert!(!h.session.snapshot().stalled);
}

/// Records callbacks and calls `stop()` from inside one of them.
struct StopInside {
    recorder: RecordingHooks,
    session: Arc<OnceLock<Weak<StreamSession>>>,
    on_error: bool,
}

impl StopInside {
    fn stop(&self) {
        if let Some(session) = self.session.get().and_then(Weak::upgrade) {
            session.stop();
        }
    }
}

impl SessionHooks for StopInside {
    fn on_event(&self, event: &ParsedEvent) {
        self.recorder.on_event(event);
    }

    fn on_start(&self, response: &ResponseMeta) {
        self.recorder.on_start(response);
    }

    fn on_stream_end(&self) {
        self.recorder.on_stream_end();
        if !self.on_error {
            self.stop();
        }
    }

    fn on_complete(&self, report: Option<&str>) {
        self.recorder.on_complete(report);
    }

    fn on_error(&self, error: &StreamError) {
        self.recorder.on_error(error);
        if self.on_error {
            self.stop();
        }
    }
}

fn session_stopping_inside(
    client: &MockHttpClient,
    config: SessionConfig,
    on_error: bool,
) -> (Arc<StreamSession>, RecordingHooks) {
    let recorder = RecordingHooks::new();
    let slot = Arc::new(OnceLock::new());
    let hooks = StopInside {
        recorder: recorder.clone(),
        session: slot.clone(),
        on_error,
    };
    let session = Arc::new(
        StreamSession::builder(
            Arc::new(client.clone()),
            Arc::new(InMemoryBackupStore::new()),
            StreamRequest::get(STREAM_URL),
        )
        .hooks(Arc::new(hooks))
        .config(config)
        .build(),
    );
    let _ = slot.set(Arc::downgrade(&session));
    (session, recorder)
}

#[tokio::test(start_paused = true)]
async fn test_stop_from_stream_end_suppresses_complete() {
    let client = MockHttpClient::new();
    client.push_response(MockResponse::Stream(MockResponse::chunks([text_frame(
        "e1",
        "===BLACKBOX_REPORT_START===\nx\n===BLACKBOX_REPORT_END===",
        1.0,
    )])));
    let (session, hooks) = session_stopping_inside(&client, fast_config(), false);

    session.start().await;
    session.wait_until_disconnected().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(hooks.stream_ends(), 1);
    assert!(hooks.completions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_stop_from_error_hook_suppresses_give_up_stream_end() {
    let client = MockHttpClient::new();
    client.push_response(MockResponse::Error(HttpError::ConnectionFailed(
        "refused".to_string(),
    )));
    let (session, hooks) = session_stopping_inside(&client, fast_config().with_max_retries(1), true);

    session.start().await;
    session.wait_until_disconnected().await;
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(hooks.errors().len(), 1);
    assert_eq!(hooks.stream_ends(), 0);
    assert_eq!(client.request_count(), 1);
}
