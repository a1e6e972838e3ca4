//! JSON bodies exchanged between the chat client and the server.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::chat::Role;

/// Machine-readable code sent when no credential is available at all.
pub const NO_CREDENTIAL_CODE: &str = "NO_API_KEY";
/// Machine-readable code sent when the upstream model rejected the credential.
pub const INVALID_CREDENTIAL_CODE: &str = "INVALID_API_KEY";

/// Resolve an API path under `base`, keeping any path prefix of `base`.
///
/// `http://host/undox` and `http://host/undox/` both give
/// `http://host/undox/api/chat` for `api/chat`; leading slashes on `path`
/// are ignored.
///
/// # Errors
/// Returns an error if `base` is not an absolute URL.
pub fn endpoint_url(base: &str, path: &str) -> Result<Url, url::ParseError> {
    let mut base = Url::parse(base)?;
    if !base.path().ends_with('/') {
        let prefixed = format!("{}/", base.path());
        base.set_path(&prefixed);
    }
    base.join(path.trim_start_matches('/'))
}

/// One message of the outbound history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Author.
    pub role: Role,
    /// Text content, already enriched for the last user turn.
    pub content: String,
}

impl WireMessage {
    /// Build a wire message.
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Body of `POST /api/chat`.
///
/// `category` stays a raw string so the server can answer an unknown value
/// with its own error body instead of a generic deserialization rejection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Full conversation history, oldest first.
    pub messages: Vec<WireMessage>,
    /// Category identifier.
    pub category: String,
    /// Caller-supplied credential, takes precedence over the server's.
    #[serde(default, alias = "apiKey", skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

/// Body of `GET /api/config`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    /// Whether the server holds its own credential.
    pub has_server_key: bool,
    /// Model used for completions.
    pub default_model: String,
}

/// Error body returned by every endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Either a machine-readable code or a human-readable message.
    pub error: String,
    /// Optional human-readable detail accompanying a code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Error body with a message only.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    /// Error body carrying a code and a message.
    #[must_use]
    pub fn coded(code: &str, message: impl Into<String>) -> Self {
        Self {
            error: code.to_string(),
            message: Some(message.into()),
        }
    }

    /// Whether this body signals a missing or rejected credential.
    #[must_use]
    pub fn is_credential_error(&self) -> bool {
        self.error == NO_CREDENTIAL_CODE || self.error == INVALID_CREDENTIAL_CODE
    }
}
