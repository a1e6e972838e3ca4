//! Configuration for the chat client.

use std::time::Duration;

use url::Url;

use crate::client::error::SessionError;
use crate::protocol::endpoint_url;

/// Environment variable overriding the server address.
pub const SERVER_URL_ENV: &str = "UNDOX_SERVER_URL";
/// Default server address.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
/// Default time budget of one wallet lookup.
pub const DEFAULT_WALLET_TIMEOUT: Duration = Duration::from_secs(5);

/// Client-side settings.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the undox server.
    pub server_url: String,
    /// Time budget of each wallet lookup during enrichment.
    pub wallet_timeout: Duration,
    /// Connect timeout for every request to the server.
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            wallet_timeout: DEFAULT_WALLET_TIMEOUT,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ClientConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the config from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(SERVER_URL_ENV)
            && !url.trim().is_empty()
        {
            config.server_url = url;
        }
        config
    }

    /// Set the server address.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }

    /// Set the wallet lookup timeout.
    #[must_use]
    pub const fn with_wallet_timeout(mut self, timeout: Duration) -> Self {
        self.wallet_timeout = timeout;
        self
    }

    /// Resolve an endpoint path against the server address.
    ///
    /// A path prefix in the server address is kept, so the server may be
    /// mounted below the root.
    ///
    /// # Errors
    /// Returns an error if the server address is not a valid base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url, SessionError> {
        endpoint_url(&self.server_url, path)
            .map_err(|err| SessionError::Config(format!("invalid server url {}: {err}", self.server_url)))
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if the server address does not parse or a timeout is zero.
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.wallet_timeout.is_zero() {
            return Err(SessionError::Config("wallet_timeout must be > 0".to_string()));
        }
        self.endpoint("/").map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let config = ClientConfig::new().with_server_url("http://localhost:8080");
        assert_eq!(
            config.endpoint("/api/chat").unwrap().as_str(),
            "http://localhost:8080/api/chat"
        );
    }

    #[test]
    fn test_endpoint_under_path_prefix() {
        let config = ClientConfig::new().with_server_url("http://gateway.local/undox/");
        assert_eq!(
            config.endpoint("/api/config").unwrap().as_str(),
            "http://gateway.local/undox/api/config"
        );
    }

    #[test]
    fn test_validate() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::new().with_server_url("not a url").validate().is_err());
        assert!(
            ClientConfig::new()
                .with_wallet_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }
}
