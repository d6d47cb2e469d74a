//! Mock implementations for testing.
//!
//! This module provides mock implementations of all trait abstractions,
//! enabling session tests without network dependencies or file system access.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - Streaming transport with a scripted response per attempt
//! - [`InMemoryBackupStore`] - In-memory backup storage
//! - [`RecordingHooks`] - Records every lifecycle callback in order

pub mod backup;
pub mod hooks;
pub mod http;

pub use backup::InMemoryBackupStore;
pub use hooks::{HookCall, RecordingHooks};
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
