//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - Streaming HTTP transport
//! - [`BackupStore`] - Durable session backup storage
//! - [`SessionHooks`] - Lifecycle callbacks for the caller

pub mod backup;
pub mod hooks;
pub mod http;

pub use backup::{BackupError, BackupStore};
pub use hooks::{NoopHooks, SessionHooks};
pub use http::{ByteStream, Headers, HttpClient, HttpError, ResponseMeta, StreamResponse};
