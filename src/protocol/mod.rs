//! Wire protocol between the chat client and the stream proxy.
//!
//! - `lines`: byte buffering into complete lines
//! - `frame`: `data: {json}` frame codec and incremental decoder
//! - `wire`: JSON request/response bodies and error codes

pub mod frame;
pub mod lines;
pub mod wire;

pub use frame::{DONE_LINE, FrameDecoder, MalformedFrame, StreamFrame};
pub use lines::LineBuffer;
pub use wire::{
    ChatRequest, ConfigResponse, ErrorBody, INVALID_CREDENTIAL_CODE, NO_CREDENTIAL_CODE,
    WireMessage, endpoint_url,
};
