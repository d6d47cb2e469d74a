//! Session and request configuration.
//!
//! Use the builder methods to customize behavior.
//!
//! # Example
//!
//! ```ignore
//! use scanstream::config::{SessionConfig, StreamRequest};
//! use scanstream::report::ReportMode;
//!
//! let request = StreamRequest::post("https://app.local/api/scan/start", serde_json::json!({"target": "10.0.0.5"}));
//! let config = SessionConfig::default()
//!     .with_max_retries(5)
//!     .with_report_mode(ReportMode::Whitebox);
//! ```

use std::time::Duration;

use tracing::warn;

use crate::report::ReportMode;
use crate::traits::Headers;

/// HTTP method used to open the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMethod {
    #[default]
    Get,
    Post,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
        }
    }
}

/// The "start scan" endpoint the session streams from.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub url: String,
    pub method: RequestMethod,
    /// JSON body, sent with `Content-Type: application/json`
    pub body: Option<serde_json::Value>,
    /// Extra request headers (auth, etc.)
    pub headers: Headers,
}

impl StreamRequest {
    /// A bodiless GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: RequestMethod::Get,
            body: None,
            headers: Headers::new(),
        }
    }

    /// A POST request with a JSON body.
    pub fn post(url: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            url: url.into(),
            method: RequestMethod::Post,
            body: Some(body),
            headers: Headers::new(),
        }
    }

    /// Add or replace a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Default resumption header.
pub const LAST_EVENT_ID_HEADER: &str = "Last-Event-ID";
/// Default correlation header read on connect.
pub const SESSION_ID_HEADER: &str = "X-Session-ID";

/// Configuration for a `StreamSession`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Consecutive transport failures tolerated before giving up (default: 10)
    pub max_retries: u32,
    /// First backoff delay; doubles per failure (default: 1s)
    pub base_delay: Duration,
    /// Backoff ceiling (default: 30s)
    pub max_backoff: Duration,
    /// How often the stall check runs while connected (default: 60s)
    pub health_check_interval: Duration,
    /// Silence longer than this is reported as a stall (default: 60s)
    pub stale_after: Duration,
    /// Which report markers to look for (default: blackbox)
    pub report_mode: ReportMode,
    /// Header carrying the resumption token (default: `Last-Event-ID`)
    pub resume_header: String,
    /// Response header holding the remote session id (default: `X-Session-ID`)
    pub session_id_header: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_retries: 10,
            base_delay: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
            health_check_interval: Duration::from_secs(60),
            stale_after: Duration::from_secs(60),
            report_mode: ReportMode::Blackbox,
            resume_header: LAST_EVENT_ID_HEADER.to_string(),
            session_id_header: SESSION_ID_HEADER.to_string(),
        }
    }
}

impl SessionConfig {
    /// Create a new SessionConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }

    pub fn with_health_check_interval(mut self, interval: Duration) -> Self {
        self.health_check_interval = interval;
        self
    }

    pub fn with_stale_after(mut self, threshold: Duration) -> Self {
        self.stale_after = threshold;
        self
    }

    pub fn with_report_mode(mut self, mode: ReportMode) -> Self {
        self.report_mode = mode;
        self
    }

    pub fn with_resume_header(mut self, header: impl Into<String>) -> Self {
        self.resume_header = header.into();
        self
    }

    pub fn with_session_id_header(mut self, header: impl Into<String>) -> Self {
        self.session_id_header = header.into();
        self
    }

    /// Defaults overridden by `SCANSTREAM_*` environment variables.
    ///
    /// Recognised: `SCANSTREAM_MAX_RETRIES`, `SCANSTREAM_BASE_DELAY_MS`,
    /// `SCANSTREAM_MAX_BACKOFF_MS`, `SCANSTREAM_HEALTH_CHECK_MS`,
    /// `SCANSTREAM_REPORT_MODE`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(n) = env_parse::<u32>("SCANSTREAM_MAX_RETRIES") {
            config.max_retries = n;
        }
        if let Some(ms) = env_parse::<u64>("SCANSTREAM_BASE_DELAY_MS") {
            config.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("SCANSTREAM_MAX_BACKOFF_MS") {
            config.max_backoff = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("SCANSTREAM_HEALTH_CHECK_MS") {
            config.health_check_interval = Duration::from_millis(ms);
            config.stale_after = Duration::from_millis(ms);
        }
        if let Some(mode) = env_parse::<ReportMode>("SCANSTREAM_REPORT_MODE") {
            config.report_mode = mode;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring invalid environment override");
            None
        }
    }
}
