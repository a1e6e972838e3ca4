//! Error types for wallet lookups.

use thiserror::Error;

/// Errors that can occur while fetching wallet data.
#[derive(Debug, Error)]
pub enum WalletError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("endpoint returned status {0}")]
    Status(u16),

    /// The JSON-RPC node reported an error.
    #[error("{0}")]
    Rpc(String),

    /// The response could not be interpreted.
    #[error("malformed RPC response: {0}")]
    MalformedResponse(String),

    /// Chain is not supported.
    #[error("unsupported chain: {0}")]
    UnsupportedChain(String),

    /// The lookup did not settle within its time budget.
    #[error("timed out after {0} ms")]
    Timeout(u64),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl WalletError {
    /// Short reason embedded in a failed [`WalletResult`](crate::wallet::WalletResult).
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Http(err) if err.is_timeout() => "RPC request timed out".to_string(),
            Self::Http(_) => "Failed to connect to blockchain RPC".to_string(),
            Self::Status(_) => "Could not fetch wallet data".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_passthrough() {
        assert_eq!(WalletError::Rpc("UNKNOWN_ACCOUNT".to_string()).reason(), "UNKNOWN_ACCOUNT");
        assert_eq!(WalletError::Timeout(5000).reason(), "timed out after 5000 ms");
        assert_eq!(WalletError::Status(502).reason(), "Could not fetch wallet data");
    }
}
