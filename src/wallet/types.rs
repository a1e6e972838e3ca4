//! Wallet query and result types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::wallet::error::WalletError;

/// Supported chains.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    /// NEAR protocol, balances in yoctoNEAR.
    Near,
    /// Ethereum mainnet, balances in wei.
    Ethereum,
}

impl Chain {
    /// Stable lowercase identifier used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Near => "near",
            Self::Ethereum => "ethereum",
        }
    }

    /// Ticker of the native unit.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Near => "NEAR",
            Self::Ethereum => "ETH",
        }
    }

    /// Number of decimal places between the atomic unit and the native unit.
    #[must_use]
    pub const fn decimals(self) -> u32 {
        match self {
            Self::Near => 24,
            Self::Ethereum => 18,
        }
    }

    /// Fractional digits shown for a balance.
    #[must_use]
    pub const fn display_precision(self) -> u32 {
        match self {
            Self::Near => 4,
            Self::Ethereum => 6,
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "near" => Ok(Self::Near),
            "ethereum" => Ok(Self::Ethereum),
            other => Err(WalletError::UnsupportedChain(other.to_string())),
        }
    }
}

/// A detected address to look up.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct WalletQuery {
    /// Address as it should be sent to the chain.
    pub address: String,
    /// Chain the address belongs to.
    pub chain: Chain,
}

impl WalletQuery {
    /// Build a query.
    #[must_use]
    pub fn new(address: impl Into<String>, chain: Chain) -> Self {
        Self {
            address: address.into(),
            chain,
        }
    }
}

/// Outcome of one wallet lookup. Exactly one per query, success or not.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletResult {
    /// Queried address.
    pub address: String,
    /// Queried chain.
    pub chain: Chain,
    /// Human readable balance with unit, or `unknown` on failure.
    pub balance: String,
    /// Number of sent transactions (ethereum).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_count: Option<u64>,
    /// Storage used by the account (near).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_used: Option<String>,
    /// Whether a contract is deployed on the account (near).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_contract: Option<bool>,
    /// Failure reason; set only when the lookup failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Balance placeholder for failed lookups.
pub const UNKNOWN_BALANCE: &str = "unknown";

impl WalletResult {
    /// Successful result with only a balance filled in.
    #[must_use]
    pub fn balance(query: &WalletQuery, balance: impl Into<String>) -> Self {
        Self {
            address: query.address.clone(),
            chain: query.chain,
            balance: balance.into(),
            transaction_count: None,
            storage_used: None,
            has_contract: None,
            error: None,
        }
    }

    /// Failed result carrying `reason`.
    #[must_use]
    pub fn failed(query: &WalletQuery, reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::balance(query, UNKNOWN_BALANCE)
        }
    }

    /// Whether the lookup failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_parse() {
        assert_eq!("near".parse::<Chain>().unwrap(), Chain::Near);
        assert_eq!("ethereum".parse::<Chain>().unwrap(), Chain::Ethereum);
        assert!(matches!(
            "solana".parse::<Chain>(),
            Err(WalletError::UnsupportedChain(_))
        ));
    }

    #[test]
    fn test_failed_result_shape() {
        let query = WalletQuery::new("alice.near", Chain::Near);
        let result = WalletResult::failed(&query, "UNKNOWN_ACCOUNT");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["balance"], UNKNOWN_BALANCE);
        assert_eq!(value["error"], "UNKNOWN_ACCOUNT");
        assert!(value.get("transactionCount").is_none());
    }

    #[test]
    fn test_success_result_has_no_error_field() {
        let query = WalletQuery::new("0xabc", Chain::Ethereum);
        let mut result = WalletResult::balance(&query, "1.000000 ETH");
        result.transaction_count = Some(3);
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("error").is_none());
        assert_eq!(value["transactionCount"], 3);
        assert_eq!(value["chain"], "ethereum");
    }
}
