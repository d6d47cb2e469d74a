//! Connection state and the caller-visible session snapshot.

use std::fmt;
use std::time::Duration;

use crate::error::StreamError;
use crate::logs::LogEntry;

/// The four-valued status callers render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Reconnecting => "reconnecting",
        };
        f.write_str(label)
    }
}

/// Why a session is sitting in `Disconnected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisconnectReason {
    /// Never started.
    #[default]
    Idle,
    /// `stop()`, teardown, or a transport cancellation.
    Stopped,
    /// The server closed the stream normally.
    Completed,
    /// `max_retries` consecutive failures; only `reconnect()` revives it.
    RetriesExhausted,
}

/// Tagged connection state. Exactly one variant is active per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected { reason: DisconnectReason },
    /// `attempt` is the retry count carried into this attempt (0 on a fresh chain).
    Connecting { attempt: u32 },
    Connected,
    Reconnecting { attempt: u32, delay: Duration },
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected {
            reason: DisconnectReason::Idle,
        }
    }
}

impl ConnectionState {
    pub fn status(&self) -> ConnectionStatus {
        match self {
            ConnectionState::Disconnected { .. } => ConnectionStatus::Disconnected,
            ConnectionState::Connecting { .. } => ConnectionStatus::Connecting,
            ConnectionState::Connected => ConnectionStatus::Connected,
            ConnectionState::Reconnecting { .. } => ConnectionStatus::Reconnecting,
        }
    }

    /// True while connected or waiting out a backoff.
    pub fn is_streaming(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connected | ConnectionState::Reconnecting { .. }
        )
    }

    pub fn disconnect_reason(&self) -> Option<DisconnectReason> {
        match self {
            ConnectionState::Disconnected { reason } => Some(*reason),
            _ => None,
        }
    }
}

/// Point-in-time view of a session, published on every change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionSnapshot {
    /// Deduplicated log entries in insertion order.
    pub logs: Vec<LogEntry>,
    pub state: ConnectionState,
    pub connection_status: ConnectionStatus,
    pub is_streaming: bool,
    pub final_report: Option<String>,
    /// Most recent transport failure, cleared on connect.
    pub error: Option<StreamError>,
    pub retry_count: u32,
    /// Delay of the pending reconnect, zero when none is scheduled.
    pub reconnect_delay: Duration,
    pub max_retries: u32,
    pub disconnect_reason: Option<DisconnectReason>,
    /// Remote correlation id read from the connect response.
    pub session_id: Option<String>,
    pub last_event_id: Option<String>,
    /// Connected, but no frame arrived within the stale threshold.
    pub stalled: bool,
}

impl SessionSnapshot {
    /// Retries ran out and no attempt is pending.
    pub fn gave_up(&self) -> bool {
        self.disconnect_reason == Some(DisconnectReason::RetriesExhausted)
    }
}
