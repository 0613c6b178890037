//! Streaming response bodies and line framing.

use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

use super::TransportError;

/// Boxed byte stream of a response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Streaming HTTP response.
pub struct StreamingResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers, with lowercase names.
    pub headers: HashMap<String, String>,
    /// Byte stream.
    pub stream: ByteStream,
}

impl StreamingResponse {
    /// Returns true if the status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl std::fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Splits an arbitrarily chunked byte stream into `\n`-terminated lines.
///
/// Bytes are buffered until a newline arrives, so multi-byte UTF-8 sequences
/// split across chunks are reassembled before decoding. A trailing `\r` is
/// removed from each line. Lines that are not valid UTF-8 come back as `Err`
/// carrying the lossy text, so callers can skip them.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buffer: Vec<u8>,
}

impl LineBuffer {
    /// Creates an empty line buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<String, String>> {
        self.buffer.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buffer[start..].iter().position(|b| *b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.buffer[start..end]));
            start = end + 1;
        }
        self.buffer.drain(..start);

        lines
    }

    /// Returns the unterminated remainder, if any, and clears the buffer.
    pub fn finish(&mut self) -> Option<Result<String, String>> {
        if self.buffer.is_empty() {
            return None;
        }
        let line = decode_line(&self.buffer);
        self.buffer.clear();
        Some(line)
    }

    /// Number of bytes waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn decode_line(raw: &[u8]) -> Result<String, String> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    match std::str::from_utf8(raw) {
        Ok(line) => Ok(line.to_string()),
        Err(_) => Err(String::from_utf8_lossy(raw).into_owned()),
    }
}
