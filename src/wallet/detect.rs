//! Address detection in free text.

use std::collections::HashSet;

use regex::Regex;

use crate::wallet::error::WalletError;
use crate::wallet::types::{Chain, WalletQuery};

const ETH_ADDRESS: &str = r"\b0x[0-9a-fA-F]{40}\b";
const NEAR_ADDRESS: &str = r"(?i)\b[a-z0-9][a-z0-9_-]*\.near\b";

/// Finds ethereum and near addresses in user text.
#[derive(Clone, Debug)]
pub struct AddressDetector {
    eth: Regex,
    near: Regex,
}

impl AddressDetector {
    /// Compile the address grammars.
    ///
    /// # Errors
    /// Returns an error if a pattern fails to compile.
    pub fn new() -> Result<Self, WalletError> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|err| WalletError::Config(format!("invalid regex: {err}")))
        };
        Ok(Self {
            eth: compile(ETH_ADDRESS)?,
            near: compile(NEAR_ADDRESS)?,
        })
    }

    /// Detect addresses in `text`.
    ///
    /// Results follow first-occurrence order across both grammars. Ethereum
    /// addresses keep their original case; near accounts are lowercased.
    /// Duplicates are compared case-insensitively and only the first is kept.
    /// Each grammar matches independently, so one span can yield an entry
    /// for both chains.
    #[must_use]
    pub fn detect(&self, text: &str) -> Vec<WalletQuery> {
        let mut matches: Vec<(usize, WalletQuery)> = self
            .eth
            .find_iter(text)
            .map(|m| (m.start(), WalletQuery::new(m.as_str(), Chain::Ethereum)))
            .chain(self.near.find_iter(text).map(|m| {
                (
                    m.start(),
                    WalletQuery::new(m.as_str().to_lowercase(), Chain::Near),
                )
            }))
            .collect();
        // Stable: at equal offsets the ethereum match stays first.
        matches.sort_by_key(|(start, _)| *start);

        let mut seen = HashSet::new();
        matches
            .into_iter()
            .map(|(_, query)| query)
            .filter(|query| seen.insert(query.address.to_lowercase()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> AddressDetector {
        AddressDetector::new().unwrap()
    }

    #[test]
    fn test_mixed_text_order_and_case() {
        let found = detector()
            .detect("send to 0xABCDEF0123456789ABCDEF0123456789ABCDEF01 and alice.near");
        assert_eq!(
            found,
            vec![
                WalletQuery::new("0xABCDEF0123456789ABCDEF0123456789ABCDEF01", Chain::Ethereum),
                WalletQuery::new("alice.near", Chain::Near),
            ]
        );
    }

    #[test]
    fn test_first_occurrence_order_across_grammars() {
        let found = detector()
            .detect("Bob.NEAR paid 0xabcdef0123456789abcdef0123456789abcdef01 yesterday");
        assert_eq!(found[0], WalletQuery::new("bob.near", Chain::Near));
        assert_eq!(found[1].chain, Chain::Ethereum);
    }

    #[test]
    fn test_case_insensitive_dedupe() {
        let found = detector().detect(
            "0xabcdef0123456789abcdef0123456789abcdef01 vs 0xABCDEF0123456789ABCDEF0123456789ABCDEF01, \
             carol.near and CAROL.near",
        );
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].address, "0xabcdef0123456789abcdef0123456789abcdef01");
        assert_eq!(found[1].address, "carol.near");
    }

    #[test]
    fn test_rejects_wrong_lengths() {
        let found = detector().detect(
            "0x123 and 0xABCDEF0123456789ABCDEF0123456789ABCDEF0123 are not addresses",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_label_characters() {
        let found = detector().detect("try my_wallet-01.near please");
        assert_eq!(found, vec![WalletQuery::new("my_wallet-01.near", Chain::Near)]);
    }

    #[test]
    fn test_grammars_match_independently() {
        let found = detector().detect("see 0xABCDEF0123456789ABCDEF0123456789ABCDEF01.near now");
        assert_eq!(
            found,
            vec![
                WalletQuery::new("0xABCDEF0123456789ABCDEF0123456789ABCDEF01", Chain::Ethereum),
                WalletQuery::new("0xabcdef0123456789abcdef0123456789abcdef01.near", Chain::Near),
            ]
        );
    }

    #[test]
    fn test_no_addresses() {
        assert!(detector().detect("what is a rollup?").is_empty());
    }
}
