//! Atomic-unit to display-unit conversion.
//!
//! Balances arrive as integers in the chain's smallest unit. They are scaled
//! with integer division and remainder only; going through `f64` would lose
//! precision well before realistic balances (2^53 wei is about 0.009 ETH).

use crate::wallet::error::WalletError;
use crate::wallet::types::Chain;

/// Format `atomic` as a decimal with `decimals` scale, truncated to `precision`
/// fractional digits.
///
/// `precision` is clamped to `decimals`.
#[must_use]
pub fn format_atomic(atomic: u128, decimals: u32, precision: u32) -> String {
    let precision = precision.min(decimals);
    let scale = 10_u128.pow(decimals);
    let whole = atomic / scale;
    let fraction = (atomic % scale) / 10_u128.pow(decimals - precision);
    if precision == 0 {
        return whole.to_string();
    }
    format!("{whole}.{fraction:0width$}", width = precision as usize)
}

/// Format a balance for `chain`, including the unit symbol.
#[must_use]
pub fn format_balance(chain: Chain, atomic: u128) -> String {
    format!(
        "{} {}",
        format_atomic(atomic, chain.decimals(), chain.display_precision()),
        chain.symbol()
    )
}

/// Parse a decimal atomic amount such as NEAR's `"1000000000000000000000000"`.
///
/// # Errors
/// Returns an error if the string is not an unsigned integer that fits in 128 bits.
pub fn parse_decimal_amount(raw: &str) -> Result<u128, WalletError> {
    raw.trim()
        .parse::<u128>()
        .map_err(|err| WalletError::MalformedResponse(format!("amount {raw:?}: {err}")))
}

/// Parse a `0x`-prefixed hex quantity as returned by Ethereum JSON-RPC.
///
/// # Errors
/// Returns an error if the prefix is missing or the digits are not valid hex
/// within 128 bits.
pub fn parse_hex_quantity(raw: &str) -> Result<u128, WalletError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or_else(|| WalletError::MalformedResponse(format!("quantity {raw:?} lacks 0x")))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|err| WalletError::MalformedResponse(format!("quantity {raw:?}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_ether_is_exact() {
        assert_eq!(format_atomic(1_000_000_000_000_000_000, 18, 6), "1.000000");
        assert_eq!(
            format_balance(Chain::Ethereum, 1_000_000_000_000_000_000),
            "1.000000 ETH"
        );
    }

    #[test]
    fn test_near_precision() {
        let yocto = 12_345_678_900_000_000_000_000_000_u128;
        assert_eq!(format_balance(Chain::Near, yocto), "12.3456 NEAR");
        assert_eq!(format_balance(Chain::Near, 0), "0.0000 NEAR");
    }

    #[test]
    fn test_truncates_instead_of_rounding() {
        assert_eq!(format_atomic(999_999_999_999_999_999, 18, 6), "0.999999");
        assert_eq!(format_atomic(1, 18, 6), "0.000000");
    }

    #[test]
    fn test_large_balance_keeps_every_whole_digit() {
        // Larger than f64 can represent exactly.
        let wei = 123_456_789_012_345_678_901_234_567_u128;
        assert_eq!(format_atomic(wei, 18, 6), "123456789.012345");
    }

    #[test]
    fn test_zero_precision() {
        assert_eq!(format_atomic(2_500, 3, 0), "2");
    }

    #[test]
    fn test_parse_quantities() {
        assert_eq!(parse_hex_quantity("0xde0b6b3a7640000").unwrap(), 1_000_000_000_000_000_000);
        assert_eq!(parse_hex_quantity("0x").unwrap(), 0);
        assert!(parse_hex_quantity("1234").is_err());
        assert!(parse_hex_quantity("0xzz").is_err());
        assert_eq!(parse_decimal_amount("42").unwrap(), 42);
        assert!(parse_decimal_amount("-1").is_err());
    }
}
