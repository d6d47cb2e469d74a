//! Recording session hooks for testing.

use std::sync::{Arc, Mutex};

use crate::error::StreamError;
use crate::sse::ParsedEvent;
use crate::traits::{ResponseMeta, SessionHooks};

/// One recorded callback.
#[derive(Debug, Clone, PartialEq)]
pub enum HookCall {
    Event(Option<String>),
    Start(ResponseMeta),
    StreamEnd,
    Complete(Option<String>),
    Error(StreamError),
}

/// Hooks that remember every call in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingHooks {
    calls: Arc<Mutex<Vec<HookCall>>>,
}

impl RecordingHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HookCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Event ids passed to `on_event`, in order.
    pub fn event_ids(&self) -> Vec<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                HookCall::Event(id) => Some(id.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<StreamError> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                HookCall::Error(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn starts(&self) -> usize {
        self.count(|c| matches!(c, HookCall::Start(_)))
    }

    pub fn stream_ends(&self) -> usize {
        self.count(|c| matches!(c, HookCall::StreamEnd))
    }

    /// Reports passed to `on_complete`, one per call.
    pub fn completions(&self) -> Vec<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|c| match c {
                HookCall::Complete(report) => Some(report.clone()),
                _ => None,
            })
            .collect()
    }

    fn count(&self, pred: impl Fn(&HookCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|&c| pred(c)).count()
    }

    fn record(&self, call: HookCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SessionHooks for RecordingHooks {
    fn on_event(&self, event: &ParsedEvent) {
        self.record(HookCall::Event(event.event_id.clone()));
    }

    fn on_start(&self, response: &ResponseMeta) {
        self.record(HookCall::Start(response.clone()));
    }

    fn on_stream_end(&self) {
        self.record(HookCall::StreamEnd);
    }

    fn on_complete(&self, report: Option<&str>) {
        self.record(HookCall::Complete(report.map(str::to_string)));
    }

    fn on_error(&self, error: &StreamError) {
        self.record(HookCall::Error(error.clone()));
    }
}
