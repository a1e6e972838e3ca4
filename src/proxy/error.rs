//! Error types for the stream proxy.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::protocol::{ErrorBody, INVALID_CREDENTIAL_CODE, NO_CREDENTIAL_CODE};

/// Errors produced while opening or relaying a stream.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Neither the caller nor the server supplied a credential.
    #[error("no API key configured")]
    NoCredential,
    /// The upstream model refused the credential.
    #[error("the API key was rejected by the model provider")]
    InvalidCredential,
    /// The category is not part of the closed set.
    #[error(transparent)]
    UnknownCategory(#[from] crate::chat::UnknownCategory),
    /// Could not reach the upstream or the connection broke.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    /// Upstream answered with a non-success status.
    #[error("upstream returned {status}: {message}")]
    UpstreamStatus {
        /// HTTP status code.
        status: u16,
        /// Upstream error message or raw body.
        message: String,
    },
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Convenience result alias for proxy operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    /// HTTP status used when this error is reported before the stream starts.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NoCredential | Self::InvalidCredential => StatusCode::UNAUTHORIZED,
            Self::UnknownCategory(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::UpstreamStatus { .. } | Self::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn body(&self) -> ErrorBody {
        match self {
            Self::NoCredential => ErrorBody::coded(
                NO_CREDENTIAL_CODE,
                "No API key configured. Provide one or set NEAR_AI_API_KEY on the server.",
            ),
            Self::InvalidCredential => ErrorBody::coded(
                INVALID_CREDENTIAL_CODE,
                "Invalid API key. Please enter a valid key.",
            ),
            other => ErrorBody::new(other.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
