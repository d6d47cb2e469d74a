//! Concrete implementations of trait abstractions.
//!
//! This module provides the production adapters behind the traits in
//! `crate::traits`.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - Streaming HTTP transport using reqwest
//! - [`FileBackupStore`] - JSON file per stream under the local data directory
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles:
//! - [`mock::MockHttpClient`] - Scripted per-attempt responses
//! - [`mock::InMemoryBackupStore`] - In-memory backup storage
//! - [`mock::RecordingHooks`] - Callback recorder

pub mod file_backup;
pub mod mock;
pub mod reqwest_http;

pub use file_backup::FileBackupStore;
pub use mock::{InMemoryBackupStore, MockHttpClient, RecordingHooks};
pub use reqwest_http::ReqwestHttpClient;
