//! Error handling for the streaming core.
//!
//! | Failure | Type | Surfaced via `on_error` | Retried |
//! |---------|------|-------------------------|---------|
//! | Malformed frame | `SseParseError` | No (warning log) | n/a |
//! | Network / non-2xx / no body | `StreamError` | Yes | Yes, up to `max_retries` |
//! | Caller cancellation | `HttpError::Cancelled` | No | No |
//! | Backup store | `BackupError` | No (warning log) | No |

mod category;
mod stream;

pub use category::ErrorCategory;
pub use stream::StreamError;
