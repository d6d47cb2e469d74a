//! Stream session error type.
//!
//! Everything that can stop a connection from being sustained. Parse
//! errors on single frames and caller cancellation never become a
//! `StreamError`.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::traits::HttpError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StreamError {
    /// The request could not be sent or no response arrived.
    #[error("Failed to connect: {0}")]
    Connect(HttpError),

    /// The server answered with a non-2xx status.
    #[error("Server returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The response had no readable body.
    #[error("Response has no readable body")]
    NoBody,

    /// The body broke off while reading.
    #[error("Stream interrupted: {0}")]
    Interrupted(HttpError),
}

impl StreamError {
    /// Classify a failed `open_stream` call.
    pub fn from_connect(err: HttpError) -> Self {
        match err {
            HttpError::ServerError { status, message } => StreamError::Status { status, message },
            other => StreamError::Connect(other),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            StreamError::Connect(_) | StreamError::Interrupted(_) => ErrorCategory::Network,
            StreamError::Status { .. } | StreamError::NoBody => ErrorCategory::Server,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::Connect(_) => "E_STREAM_CONN",
            StreamError::Status { .. } => "E_STREAM_STATUS",
            StreamError::NoBody => "E_STREAM_NOBODY",
            StreamError::Interrupted(_) => "E_STREAM_INTERRUPTED",
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::Connect(_) => {
                "Unable to reach the scan service. Retrying...".to_string()
            }
            StreamError::Status { status, .. } => match *status {
                401 | 403 => "The scan service rejected the request. Please sign in again.".to_string(),
                404 => "The scan could not be found.".to_string(),
                429 => "Too many requests. Waiting before retrying.".to_string(),
                500..=599 => "The scan service is having trouble. Retrying...".to_string(),
                _ => format!("The scan service returned an error (HTTP {}).", status),
            },
            StreamError::NoBody => "The scan service sent an empty response.".to_string(),
            StreamError::Interrupted(_) => {
                "Connection to the scan was lost. Attempting to reconnect...".to_string()
            }
        }
    }
}
