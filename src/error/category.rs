//! Error category classification.
//!
//! A coarse classification of stream failures used in logs and user
//! messaging. Both categories are retried.

use std::fmt;

/// High-level categorization of stream failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection, DNS, timeout, or a body that broke off mid-read.
    /// Transient and retryable.
    Network,

    /// The server answered with an error status or an unusable response.
    /// Retried like a network error; the scan worker may come back.
    Server,
}

impl ErrorCategory {
    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Server => "server",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check your connection; the stream will reconnect automatically",
            ErrorCategory::Server => "The scan service may be restarting. Reconnect if retries run out",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
