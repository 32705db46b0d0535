//! Splits a raw byte stream into protocol lines

use bytes::BytesMut;

/// Read buffer capacity, matching the receiver's chunk size
const INITIAL_CAPACITY: usize = 1024;

/// Incremental line framer
///
/// Bytes are pushed in whatever chunks the socket hands out. Every complete
/// `\n`-terminated line is returned (with one trailing `\r` removed) and the
/// unterminated tail stays buffered for the next push.
///
/// Framing happens on bytes, so a UTF-8 character split across two reads is
/// decoded once it is whole. Invalid sequences are replaced, not rejected.
#[derive(Debug)]
pub struct LineFramer {
    buffer: BytesMut,
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new()
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Append a chunk and drain every complete line, in stream order
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let scan_from = self.buffer.len();
        self.buffer.extend_from_slice(chunk);

        // Nothing before `scan_from` can hold a newline: it was drained last time
        let mut lines = Vec::new();
        let mut offset = scan_from;
        while let Some(pos) = self.buffer[offset..].iter().position(|b| *b == b'\n') {
            let end = offset + pos;
            let mut frame = self.buffer.split_to(end + 1);
            frame.truncate(end);
            if frame.last() == Some(&b'\r') {
                frame.truncate(end - 1);
            }
            lines.push(String::from_utf8_lossy(&frame).into_owned());
            offset = 0;
        }

        lines
    }

    /// The buffered, not yet terminated, partial line
    pub fn pending(&self) -> &[u8] {
        &self.buffer
    }
}
