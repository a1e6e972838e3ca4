//! Stream frame codec.
//!
//! Wire format, one frame per event:
//!
//! ```text
//! data: {"content":"Hel"}
//!
//! data: {"content":"lo"}
//!
//! data: [DONE]
//! ```

use serde::{Deserialize, Serialize};

use crate::protocol::lines::LineBuffer;

/// Prefix of every data line.
pub const DATA_PREFIX: &str = "data: ";
/// Literal terminal line.
pub const DONE_LINE: &str = "data: [DONE]";

/// One event of the stream protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StreamFrame {
    /// A text delta.
    Content(String),
    /// End of stream.
    Done,
}

#[derive(Serialize, Deserialize)]
struct ContentPayload<'a> {
    content: std::borrow::Cow<'a, str>,
}

impl StreamFrame {
    /// Encode the frame including its blank separator line.
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Content(text) => {
                let payload = ContentPayload {
                    content: std::borrow::Cow::Borrowed(text),
                };
                // Serializing a struct of one string field cannot fail.
                let json = serde_json::to_string(&payload).unwrap_or_default();
                format!("{DATA_PREFIX}{json}\n\n")
            }
            Self::Done => format!("{DONE_LINE}\n\n"),
        }
    }

    /// Parse a single complete line.
    ///
    /// Returns `None` for lines that carry no frame (blank lines, comments,
    /// non-data fields).
    ///
    /// # Errors
    /// Returns [`MalformedFrame`] when a data line does not hold a JSON object
    /// with a string `content` field.
    pub fn parse_line(line: &str) -> Option<Result<Self, MalformedFrame>> {
        if line == DONE_LINE {
            return Some(Ok(Self::Done));
        }
        let data = line.strip_prefix(DATA_PREFIX)?;
        Some(
            serde_json::from_str::<ContentPayload<'_>>(data)
                .map(|payload| Self::Content(payload.content.into_owned()))
                .map_err(|err| MalformedFrame {
                    line: line.to_string(),
                    reason: err.to_string(),
                }),
        )
    }
}

/// A data line that could not be decoded.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("malformed frame {line:?}: {reason}")]
pub struct MalformedFrame {
    /// Offending line.
    pub line: String,
    /// Decoder message.
    pub reason: String,
}

/// Incremental frame decoder that tolerates arbitrary read boundaries.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    lines: LineBuffer,
}

impl FrameDecoder {
    /// Create a decoder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lines: LineBuffer::new(),
        }
    }

    /// Feed one read, returning the frames it completed in arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<StreamFrame, MalformedFrame>> {
        self.lines
            .push(chunk)
            .iter()
            .filter_map(|line| StreamFrame::parse_line(line))
            .collect()
    }

    /// Decode whatever is left once the transport reports end of stream.
    pub fn finish(&mut self) -> Option<Result<StreamFrame, MalformedFrame>> {
        self.lines
            .finish()
            .and_then(|line| StreamFrame::parse_line(&line))
    }
}
