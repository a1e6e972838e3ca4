//! Rendering wallet results into a prompt context block.

use std::fmt::Write as _;

use crate::wallet::types::WalletResult;

const HEADER: &str = "\n[WALLET DATA - Fetched privately by UNDOX]\n";
const FOOTER: &str = "\n[END WALLET DATA]\n";

/// Render `results` as one delimited block, one section per result in order.
///
/// Returns an empty string for an empty batch.
#[must_use]
pub fn aggregate(results: &[WalletResult]) -> String {
    if results.is_empty() {
        return String::new();
    }

    let mut block = String::from(HEADER);
    for result in results {
        let _ = write!(
            block,
            "\n{} | {}\n",
            result.chain.as_str().to_uppercase(),
            result.address
        );
        if let Some(error) = &result.error {
            let _ = writeln!(block, "  Status: Could not fetch ({error})");
            continue;
        }
        let _ = writeln!(block, "  Balance: {}", result.balance);
        if let Some(count) = result.transaction_count {
            let _ = writeln!(block, "  Transaction count: {count}");
        }
        if let Some(storage) = &result.storage_used {
            let _ = writeln!(block, "  Storage used: {storage}");
        }
        if let Some(has_contract) = result.has_contract {
            let answer = if has_contract { "Yes" } else { "No" };
            let _ = writeln!(block, "  Has deployed contract: {answer}");
        }
    }
    block.push_str(FOOTER);
    block
}

/// Put a context block in front of the user's message.
#[must_use]
pub fn prepend_context(context: &str, message: &str) -> String {
    if context.is_empty() {
        return message.to_string();
    }
    format!("{context}\n{message}")
}
