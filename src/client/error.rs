//! Client-side error types.

use thiserror::Error;

use crate::chat::ConversationId;
use crate::store::StoreError;
use crate::wallet::WalletError;

/// Why a streamed turn could not produce a reply.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// No usable credential; the cached one has been cleared.
    #[error("Invalid API key. Please enter a valid key")]
    NoCredential,

    /// The server answered with an error message.
    #[error("{0}")]
    Upstream(String),

    /// The connection failed.
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors surfaced by [`ChatSession`](crate::client::ChatSession) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Neither text nor an attachment was supplied.
    #[error("message is empty")]
    EmptyMessage,

    /// The conversation does not exist.
    #[error("unknown conversation {0}")]
    UnknownConversation(ConversationId),

    /// A reply is still streaming for this conversation.
    #[error("a reply is already streaming for conversation {0}")]
    Busy(ConversationId),

    /// Local storage could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Wallet enrichment could not be set up.
    #[error(transparent)]
    Wallet(#[from] WalletError),

    /// HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}
