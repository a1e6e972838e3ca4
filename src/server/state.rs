//! Application state shared across all request handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::proxy::{ProxyConfig, StreamProxy};
use crate::wallet::{RpcWalletSource, WalletConfig, WalletSource};

/// Shared application state.
pub struct AppState {
    /// Stream proxy to the upstream model.
    pub proxy: StreamProxy,
    /// Backend for `GET /api/wallet`.
    pub wallets: Arc<dyn WalletSource>,
    /// Time budget of one wallet lookup.
    pub wallet_timeout: Duration,
}

impl AppState {
    /// Create the application state from configuration.
    ///
    /// # Errors
    /// Returns an error if either configuration is invalid.
    pub fn new(
        proxy: &ProxyConfig,
        wallet: &WalletConfig,
    ) -> Result<Arc<Self>, Box<dyn std::error::Error + Send + Sync>> {
        let proxy = StreamProxy::new(proxy)?;
        let wallets = RpcWalletSource::new(wallet)?;
        Ok(Self::from_parts(proxy, Arc::new(wallets), wallet.timeout))
    }

    /// Create the application state from already-built parts.
    #[must_use]
    pub fn from_parts(
        proxy: StreamProxy,
        wallets: Arc<dyn WalletSource>,
        wallet_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            proxy,
            wallets,
            wallet_timeout,
        })
    }
}
