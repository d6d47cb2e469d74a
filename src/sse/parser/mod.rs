//! Incremental frame parser
//!
//! Bytes are appended to an internal buffer as they arrive; complete
//! frames (terminated by a blank line, `\n\n` or `\r\n\r\n`) are split
//! off and handed to [`parse_frame`]. Partial frames stay buffered
//! across calls, so a chunk may end anywhere, even inside a UTF-8
//! sequence or between `\r` and `\n`.

mod fields;

pub use fields::{decode_frame, parse_frame};

use crate::sse::events::SseFrame;

/// Stateful byte-stream splitter that emits complete frames.
#[derive(Debug, Default)]
pub struct FrameParser {
    buffer: Vec<u8>,
    /// Start of the line being scanned.
    line_start: usize,
    /// Next byte to inspect; everything before it has been scanned.
    scan_pos: usize,
}

impl FrameParser {
    /// Create a new parser with an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Locate the next blank line, resuming where the last call stopped.
    ///
    /// Returns `(frame_end, consumed)`: the frame is `buffer[..frame_end]`
    /// and `buffer[..consumed]` can be dropped. Leading blank lines produce
    /// an empty frame, which the caller ignores.
    fn find_frame_end(&mut self) -> Option<(usize, usize)> {
        while self.scan_pos < self.buffer.len() {
            let i = self.scan_pos;
            self.scan_pos += 1;
            if self.buffer[i] != b'\n' {
                continue;
            }
            let line = &self.buffer[self.line_start..i];
            if line.is_empty() || line == b"\r" {
                let frame_end = self.line_start;
                self.line_start = 0;
                self.scan_pos = 0;
                return Some((frame_end, i + 1));
            }
            self.line_start = i + 1;
        }
        None
    }

    /// Append a chunk and return every frame it completed, in order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some((frame_end, consumed)) = self.find_frame_end() {
            if frame_end > 0 {
                let raw = String::from_utf8_lossy(&self.buffer[..frame_end]);
                if let Some(frame) = parse_frame(&raw) {
                    frames.push(frame);
                }
            }
            self.buffer.drain(..consumed);
        }
        frames
    }

    /// Flush whatever is left once the transport reports end-of-stream.
    pub fn finish(&mut self) -> Option<SseFrame> {
        if self.buffer.is_empty() {
            return None;
        }
        let raw = String::from_utf8_lossy(&self.buffer).into_owned();
        self.reset();
        parse_frame(&raw)
    }

    /// Number of bytes waiting for a frame boundary.
    pub fn pending_len(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any partial frame, e.g. when a new connection starts.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.line_start = 0;
        self.scan_pos = 0;
    }
}
