//! Direct JSON-RPC lookups against NEAR and Ethereum nodes.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::wallet::config::WalletConfig;
use crate::wallet::error::WalletError;
use crate::wallet::source::WalletSource;
use crate::wallet::types::{Chain, WalletQuery, WalletResult};
use crate::wallet::units::{format_balance, parse_decimal_amount, parse_hex_quantity};

/// Code hash of a NEAR account with no contract deployed.
const EMPTY_CODE_HASH: &str = "11111111111111111111111111111111";

#[derive(Deserialize)]
struct RpcEnvelope<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    message: Option<String>,
    cause: Option<RpcErrorCause>,
}

#[derive(Deserialize)]
struct RpcErrorCause {
    name: Option<String>,
}

#[derive(Deserialize)]
struct NearAccountView {
    amount: String,
    code_hash: String,
    storage_usage: u64,
}

/// Wallet source that talks to chain RPC nodes.
#[derive(Clone)]
pub struct RpcWalletSource {
    client: reqwest::Client,
    near_rpc_url: String,
    eth_rpc_url: String,
}

impl RpcWalletSource {
    /// Build a source from configuration.
    ///
    /// The HTTP client timeout is the configured per-query timeout.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the client cannot be built.
    pub fn new(config: &WalletConfig) -> Result<Self, WalletError> {
        config.validate()?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            near_rpc_url: config.near_rpc_url.clone(),
            eth_rpc_url: config.eth_rpc_url.clone(),
        })
    }

    async fn call<T: DeserializeOwned>(&self, url: &str, body: &Value) -> Result<T, WalletError> {
        let envelope: RpcEnvelope<T> = self
            .client
            .post(url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        if let Some(error) = envelope.error {
            let reason = error
                .cause
                .and_then(|cause| cause.name)
                .or(error.message)
                .unwrap_or_else(|| "RPC error".to_string());
            return Err(WalletError::Rpc(reason));
        }
        envelope
            .result
            .ok_or_else(|| WalletError::MalformedResponse("missing result".to_string()))
    }

    async fn fetch_near(&self, query: &WalletQuery) -> Result<WalletResult, WalletError> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": "undox",
            "method": "query",
            "params": {
                "request_type": "view_account",
                "finality": "final",
                "account_id": query.address,
            },
        });
        let view: NearAccountView = self.call(&self.near_rpc_url, &body).await?;
        let amount = parse_decimal_amount(&view.amount)?;

        let mut result = WalletResult::balance(query, format_balance(Chain::Near, amount));
        result.storage_used = Some(format!("{} bytes", view.storage_usage));
        result.has_contract = Some(view.code_hash != EMPTY_CODE_HASH);
        Ok(result)
    }

    async fn fetch_ethereum(&self, query: &WalletQuery) -> Result<WalletResult, WalletError> {
        let balance_body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getBalance",
            "params": [query.address, "latest"],
        });
        let count_body = json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "eth_getTransactionCount",
            "params": [query.address, "latest"],
        });

        let (balance, count) = tokio::try_join!(
            self.call::<String>(&self.eth_rpc_url, &balance_body),
            self.call::<String>(&self.eth_rpc_url, &count_body),
        )?;

        let wei = parse_hex_quantity(&balance)?;
        let count = u64::try_from(parse_hex_quantity(&count)?)
            .map_err(|_| WalletError::MalformedResponse(format!("transaction count {count}")))?;

        let mut result = WalletResult::balance(query, format_balance(Chain::Ethereum, wei));
        result.transaction_count = Some(count);
        Ok(result)
    }
}

#[async_trait]
impl WalletSource for RpcWalletSource {
    async fn fetch(&self, query: &WalletQuery) -> Result<WalletResult, WalletError> {
        match query.chain {
            Chain::Near => self.fetch_near(query).await,
            Chain::Ethereum => self.fetch_ethereum(query).await,
        }
    }
}
