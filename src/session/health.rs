//! Stall detection for a connected stream.
//!
//! Silence past the threshold is only reported; the connection is left
//! alone.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::clock::Clock;

pub struct StallMonitor {
    clock: Arc<dyn Clock>,
    stale_after: Duration,
    last_activity: Instant,
    stalled: bool,
}

impl StallMonitor {
    pub fn new(clock: Arc<dyn Clock>, stale_after: Duration) -> Self {
        let last_activity = clock.now_instant();
        Self {
            clock,
            stale_after,
            last_activity,
            stalled: false,
        }
    }

    /// Record that bytes arrived.
    pub fn touch(&mut self) {
        self.last_activity = self.clock.now_instant();
        self.stalled = false;
    }

    pub fn idle_for(&self) -> Duration {
        self.clock
            .now_instant()
            .saturating_duration_since(self.last_activity)
    }

    /// Returns the idle time if the stream has gone stale. Warns once per stall.
    pub fn check(&mut self) -> Option<Duration> {
        let idle = self.idle_for();
        if idle <= self.stale_after {
            return None;
        }
        if !self.stalled {
            warn!(
                idle_ms = idle.as_millis() as u64,
                threshold_ms = self.stale_after.as_millis() as u64,
                "No data received from scan stream; connection may be stale"
            );
            self.stalled = true;
        }
        Some(idle)
    }
}
