//! Session lifecycle callbacks.
//!
//! Callers persist raw events, correlation ids and reports through these
//! hooks. They run on the session's driver task and must not block; spawn
//! for anything slow.

use crate::error::StreamError;
use crate::sse::ParsedEvent;
use crate::traits::http::ResponseMeta;

/// Lifecycle callbacks dispatched by a `StreamSession`.
///
/// Every method has an empty default so callers implement only what
/// they need.
pub trait SessionHooks: Send + Sync {
    /// Every decoded frame, before log conversion.
    fn on_event(&self, _event: &ParsedEvent) {}

    /// Once per logical session, when the transport first connects.
    /// Resumed connections do not fire it again.
    fn on_start(&self, _response: &ResponseMeta) {}

    /// The transport ended for a reason other than a pending reconnect.
    fn on_stream_end(&self) {}

    /// Natural end of stream, after `on_stream_end`.
    fn on_complete(&self, _report: Option<&str>) {}

    /// Every transport failure, including ones that will be retried.
    fn on_error(&self, _error: &StreamError) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl SessionHooks for NoopHooks {}
