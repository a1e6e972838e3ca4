//! Wallet lookup backends.

use async_trait::async_trait;
use url::Url;

use crate::protocol::endpoint_url;
use crate::wallet::error::WalletError;
use crate::wallet::types::{WalletQuery, WalletResult};

/// Something that can look up one wallet.
#[async_trait]
pub trait WalletSource: Send + Sync {
    /// Fetch balance data for `query`.
    ///
    /// # Errors
    /// Returns an error when the lookup cannot produce data. Callers turn the
    /// error into a failed [`WalletResult`] rather than aborting a batch.
    async fn fetch(&self, query: &WalletQuery) -> Result<WalletResult, WalletError>;
}

/// Looks wallets up through the server's `GET /api/wallet` endpoint.
#[derive(Clone)]
pub struct EndpointWalletSource {
    client: reqwest::Client,
    endpoint: Url,
}

impl EndpointWalletSource {
    /// Build a source for the server at `base_url`, keeping any path prefix.
    ///
    /// # Errors
    /// Returns an error if the URL is invalid.
    pub fn new(client: reqwest::Client, base_url: &str) -> Result<Self, WalletError> {
        let endpoint = endpoint_url(base_url, "api/wallet")
            .map_err(|err| WalletError::Config(format!("invalid server url: {err}")))?;
        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl WalletSource for EndpointWalletSource {
    async fn fetch(&self, query: &WalletQuery) -> Result<WalletResult, WalletError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("address", &query.address)
            .append_pair("chain", query.chain.as_str());

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WalletError::Status(status.as_u16()));
        }
        Ok(response.json::<WalletResult>().await?)
    }
}
