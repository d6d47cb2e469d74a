//! scanstream - resumable Server-Sent Events client for long-running scans
//!
//! Opens a streaming HTTP connection to a scan agent, turns its frames
//! into a deduplicated activity log, captures the final report between
//! its markers and keeps the stream alive across network failures.
//!
//! The entry point is [`session::StreamSession`].

pub mod adapters;
pub mod backup;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod logs;
pub mod report;
pub mod session;
pub mod sse;
pub mod traits;
