//! Incremental decoder for newline-delimited JSON generation streams.
//!
//! The server writes one JSON object per line, but the transport hands
//! over arbitrary byte chunks. The decoder keeps everything after the last
//! newline buffered until a later chunk completes the line, so the decoded
//! output does not depend on where the chunk boundaries fall.

use tracing::debug;

use crate::types::GenerationChunk;

/// Result of feeding one chunk of bytes to the decoder.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Decoded {
    /// Complete lines that decoded successfully, in arrival order.
    pub chunks: Vec<GenerationChunk>,
    /// Complete lines that were not a valid generation object.
    pub dropped: usize,
}

/// Line buffer that survives across `push` calls.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    buffer: Vec<u8>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and decode every line they complete.
    pub fn push(&mut self, bytes: &[u8]) -> Decoded {
        let old_len = self.buffer.len();
        self.buffer.extend_from_slice(bytes);

        let mut decoded = Decoded::default();
        // Buffered bytes hold no newline, so only the new ones are scanned
        // for the first line end.
        let Some(first) = self.buffer[old_len..].iter().position(|&b| b == b'\n') else {
            return decoded;
        };

        let mut start = 0;
        let mut next = Some(old_len + first);
        while let Some(end) = next {
            match serde_json::from_slice::<GenerationChunk>(&self.buffer[start..end]) {
                Ok(chunk) => decoded.chunks.push(chunk),
                Err(e) => {
                    debug!(len = end - start, error = %e, "dropping undecodable stream line");
                    decoded.dropped += 1;
                }
            }
            start = end + 1;
            next = self.buffer[start..]
                .iter()
                .position(|&b| b == b'\n')
                .map(|offset| start + offset);
        }
        self.buffer.drain(..start);

        decoded
    }

    /// Number of buffered bytes still waiting for a newline.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Take the unterminated remainder. It is never decoded.
    pub fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }

    /// Discard any buffered bytes.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
