//! Reconnection state machine.
//!
//! [`Controller::handle`] is the only place connection state changes. It
//! performs no I/O; the driver feeds it [`ControlInput`]s and carries out
//! the returned [`Directive`].

use std::time::Duration;

use super::backoff::Backoff;
use super::state::{ConnectionState, DisconnectReason};

/// Something that happened to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlInput {
    /// Fresh chain. `resume` is the cursor seeded from a backup.
    Start { resume: Option<String> },
    /// Caller asked for an immediate attempt with a fresh budget.
    Reconnect,
    /// Caller asked to stop.
    Stop,
    /// The transport answered with a readable body.
    Opened,
    /// A frame was decoded.
    Frame { event_id: Option<String> },
    /// The body ended without error.
    Ended,
    /// The transport reported a cancellation.
    Cancelled,
    /// Connect or read failed.
    Failed,
    /// The backoff timer fired.
    BackoffElapsed,
}

/// What the driver must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Open the transport, sending `resume` as the resumption token.
    Connect { resume: Option<String> },
    /// Keep reading.
    Stream,
    /// Natural end: final extraction, `on_stream_end`, `on_complete`, clear backup.
    Complete,
    /// Sleep `delay`, then feed `BackoffElapsed`.
    Retry { delay: Duration },
    /// Budget exhausted: `on_stream_end` and stop.
    GiveUp,
    /// Terminate without callbacks.
    Silent,
    /// The input does not apply in the current state.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct Controller {
    state: ConnectionState,
    retry_count: u32,
    current_delay: Duration,
    max_retries: u32,
    backoff: Backoff,
    manual_stop: bool,
    last_event_id: Option<String>,
}

impl Controller {
    pub fn new(max_retries: u32, backoff: Backoff) -> Self {
        Self {
            state: ConnectionState::default(),
            retry_count: 0,
            current_delay: Duration::ZERO,
            max_retries,
            backoff,
            manual_stop: false,
            last_event_id: None,
        }
    }

    pub fn handle(&mut self, input: ControlInput) -> Directive {
        match input {
            ControlInput::Start { resume } => {
                self.last_event_id = resume;
                self.begin_chain()
            }

            ControlInput::Reconnect => self.begin_chain(),

            ControlInput::Stop => {
                self.manual_stop = true;
                self.current_delay = Duration::ZERO;
                self.state = ConnectionState::Disconnected {
                    reason: DisconnectReason::Stopped,
                };
                Directive::Silent
            }

            ControlInput::Opened => {
                if self.manual_stop || !matches!(self.state, ConnectionState::Connecting { .. }) {
                    return Directive::Ignore;
                }
                self.retry_count = 0;
                self.current_delay = Duration::ZERO;
                self.state = ConnectionState::Connected;
                Directive::Stream
            }

            ControlInput::Frame { event_id } => {
                if self.state != ConnectionState::Connected {
                    return Directive::Ignore;
                }
                if event_id.is_some() {
                    self.last_event_id = event_id;
                }
                Directive::Stream
            }

            ControlInput::Ended => {
                if self.manual_stop {
                    return Directive::Silent;
                }
                if self.state != ConnectionState::Connected {
                    return Directive::Ignore;
                }
                self.state = ConnectionState::Disconnected {
                    reason: DisconnectReason::Completed,
                };
                Directive::Complete
            }

            ControlInput::Cancelled => {
                if !self.manual_stop {
                    self.current_delay = Duration::ZERO;
                    self.state = ConnectionState::Disconnected {
                        reason: DisconnectReason::Stopped,
                    };
                }
                Directive::Silent
            }

            ControlInput::Failed => {
                if self.manual_stop {
                    return Directive::Silent;
                }
                if !matches!(
                    self.state,
                    ConnectionState::Connecting { .. } | ConnectionState::Connected
                ) {
                    return Directive::Ignore;
                }

                self.retry_count = self.retry_count.saturating_add(1).min(self.max_retries);
                if self.retry_count >= self.max_retries {
                    self.current_delay = Duration::ZERO;
                    self.state = ConnectionState::Disconnected {
                        reason: DisconnectReason::RetriesExhausted,
                    };
                    return Directive::GiveUp;
                }

                let delay = self.backoff.delay(self.retry_count - 1);
                self.current_delay = delay;
                self.state = ConnectionState::Reconnecting {
                    attempt: self.retry_count,
                    delay,
                };
                Directive::Retry { delay }
            }

            ControlInput::BackoffElapsed => {
                if self.manual_stop {
                    return Directive::Silent;
                }
                let ConnectionState::Reconnecting { attempt, .. } = self.state else {
                    return Directive::Ignore;
                };
                self.state = ConnectionState::Connecting { attempt };
                Directive::Connect {
                    resume: self.last_event_id.clone(),
                }
            }
        }
    }

    fn begin_chain(&mut self) -> Directive {
        self.manual_stop = false;
        self.retry_count = 0;
        self.current_delay = Duration::ZERO;
        self.state = ConnectionState::Connecting { attempt: 0 };
        Directive::Connect {
            resume: self.last_event_id.clone(),
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn current_delay(&self) -> Duration {
        self.current_delay
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn is_manually_stopped(&self) -> bool {
        self.manual_stop
    }

    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }
}
