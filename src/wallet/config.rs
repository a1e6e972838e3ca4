//! Configuration for wallet lookups.

use std::time::Duration;

use url::Url;

use crate::wallet::error::WalletError;

/// Environment variable overriding the NEAR RPC endpoint.
pub const NEAR_RPC_URL_ENV: &str = "UNDOX_NEAR_RPC_URL";
/// Environment variable overriding the Ethereum RPC endpoint.
pub const ETH_RPC_URL_ENV: &str = "UNDOX_ETH_RPC_URL";
/// Environment variable overriding the per-query timeout in milliseconds.
pub const RPC_TIMEOUT_ENV: &str = "UNDOX_RPC_TIMEOUT_MS";

/// Default NEAR mainnet RPC.
pub const DEFAULT_NEAR_RPC_URL: &str = "https://rpc.mainnet.near.org";
/// Default Ethereum mainnet RPC.
pub const DEFAULT_ETH_RPC_URL: &str = "https://eth.llamarpc.com";
/// Default per-query timeout.
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Configuration for the chain RPC clients and the fan-out.
#[derive(Clone, Debug)]
pub struct WalletConfig {
    /// NEAR JSON-RPC endpoint.
    pub near_rpc_url: String,
    /// Ethereum JSON-RPC endpoint.
    pub eth_rpc_url: String,
    /// Time budget of each individual lookup.
    pub timeout: Duration,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            near_rpc_url: DEFAULT_NEAR_RPC_URL.to_string(),
            eth_rpc_url: DEFAULT_ETH_RPC_URL.to_string(),
            timeout: DEFAULT_RPC_TIMEOUT,
        }
    }
}

impl WalletConfig {
    /// Create a config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the config from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(NEAR_RPC_URL_ENV) {
            config.near_rpc_url = url;
        }
        if let Ok(url) = std::env::var(ETH_RPC_URL_ENV) {
            config.eth_rpc_url = url;
        }
        if let Some(ms) = std::env::var(RPC_TIMEOUT_ENV)
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout = Duration::from_millis(ms);
        }
        config
    }

    /// Set the NEAR RPC endpoint.
    #[must_use]
    pub fn with_near_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.near_rpc_url = url.into();
        self
    }

    /// Set the Ethereum RPC endpoint.
    #[must_use]
    pub fn with_eth_rpc_url(mut self, url: impl Into<String>) -> Self {
        self.eth_rpc_url = url.into();
        self
    }

    /// Set the per-query timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if an endpoint does not parse or the timeout is zero.
    pub fn validate(&self) -> Result<(), WalletError> {
        if self.timeout.is_zero() {
            return Err(WalletError::Config("timeout must be > 0".to_string()));
        }
        for url in [&self.near_rpc_url, &self.eth_rpc_url] {
            Url::parse(url).map_err(|err| WalletError::Config(format!("invalid url {url}: {err}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WalletConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = WalletConfig::new()
            .with_near_rpc_url("http://localhost:3030")
            .with_eth_rpc_url("http://localhost:8545")
            .with_timeout(Duration::from_millis(250));
        assert_eq!(config.near_rpc_url, "http://localhost:3030");
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = WalletConfig::new().with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }
}
