//! Byte-to-line buffering for line-oriented streams.
//!
//! Transport reads can end anywhere, including in the middle of a line or of a
//! multi-byte UTF-8 sequence. [`LineBuffer`] keeps the undelimited tail in raw
//! bytes and only yields lines once their `\n` has arrived.

/// Incremental splitter of a byte stream into complete lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Feed one read and return every line it completed, without terminators.
    ///
    /// A trailing `\r` is stripped so `\r\n` streams behave like `\n` streams.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            lines.push(decode_line(&self.pending[start..end]));
            start = end + 1;
        }
        self.pending.drain(..start);
        lines
    }

    /// Whether undelimited bytes are waiting for more input.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Flush the undelimited tail at end of stream, if any.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let tail = std::mem::take(&mut self.pending);
        Some(decode_line(&tail))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_line_is_held_back() {
        let mut buf = LineBuffer::new();
        assert!(buf.push(b"data: {\"con").is_empty());
        assert!(buf.has_pending());
        let lines = buf.push(b"tent\":\"a\"}\n\nda");
        assert_eq!(lines, vec!["data: {\"content\":\"a\"}".to_string(), String::new()]);
        assert_eq!(buf.finish(), Some("da".to_string()));
        assert_eq!(buf.finish(), None);
    }

    #[test]
    fn test_crlf_is_normalized() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"a\r\nb\r\n"), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_split_utf8_sequence() {
        let text = "é\n".as_bytes();
        let mut buf = LineBuffer::new();
        assert!(buf.push(&text[..1]).is_empty());
        assert_eq!(buf.push(&text[1..]), vec!["é".to_string()]);
    }
}
