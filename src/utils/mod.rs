use crate::core::{SwapError, SwapResult};
use alloy::primitives::U256;
use rust_decimal::Decimal;

/// Parse a user-entered decimal amount into raw units of a currency with `decimals`.
///
/// Fails on zero, negative, malformed or over-precise input.
pub fn parse_amount(value: &str, decimals: u8) -> SwapResult<U256> {
    let parsed = Decimal::from_str_exact(value.trim())
        .map_err(|e| SwapError::InvalidAmount(format!("'{}': {}", value, e)))?
        .normalize();

    if parsed.is_sign_negative() || parsed.is_zero() {
        return Err(SwapError::InvalidAmount(format!(
            "'{}' must be greater than zero",
            value
        )));
    }

    let scale = parsed.scale();
    if scale > decimals as u32 {
        return Err(SwapError::InvalidAmount(format!(
            "'{}' has more than {} decimal places",
            value, decimals
        )));
    }

    let mantissa = U256::from(parsed.mantissa().unsigned_abs());
    let factor = U256::from(10u64).pow(U256::from(decimals as u32 - scale));
    mantissa.checked_mul(factor).ok_or(SwapError::MathOverflow)
}

/// Render a raw amount with `decimals`, dropping trailing zeros.
pub fn format_amount(raw: U256, decimals: u8) -> String {
    if decimals == 0 {
        return format_number(&raw.to_string());
    }
    let unit = U256::from(10u64).pow(U256::from(decimals));
    let whole = raw / unit;
    let fraction = raw % unit;

    if fraction.is_zero() {
        return format_number(&whole.to_string());
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = decimals as usize);
    format!(
        "{}.{}",
        format_number(&whole.to_string()),
        fraction.trim_end_matches('0')
    )
}

/// Insert thousands separators into a string of digits
pub fn format_number(digits: &str) -> String {
    let mut result = String::new();
    let mut count = 0;

    for ch in digits.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_uses_exact_decimals() {
        assert_eq!(
            parse_amount("1.5", 18).unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(parse_amount("0.00000001", 8).unwrap(), U256::from(1));
        assert_eq!(parse_amount("250", 8).unwrap(), U256::from(25_000_000_000u64));
        // trailing zeros beyond the precision are harmless
        assert_eq!(parse_amount("2.10000000000", 8).unwrap(), U256::from(210_000_000u64));
    }

    #[test]
    fn test_parse_amount_rejects_bad_input() {
        assert!(matches!(parse_amount("0", 18), Err(SwapError::InvalidAmount(_))));
        assert!(matches!(parse_amount("-1", 18), Err(SwapError::InvalidAmount(_))));
        assert!(matches!(parse_amount("abc", 18), Err(SwapError::InvalidAmount(_))));
        assert!(matches!(
            parse_amount("0.000000001", 8),
            Err(SwapError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(U256::from(1_500_000_000_000_000_000u128), 18), "1.5");
        assert_eq!(format_amount(U256::from(25_000_000_000u64), 8), "250");
        assert_eq!(format_amount(U256::from(1), 8), "0.00000001");
        assert_eq!(format_amount(U256::from(1234567u64), 0), "1,234,567");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number("1234567890"), "1,234,567,890");
        assert_eq!(format_number("1000"), "1,000");
        assert_eq!(format_number("999"), "999");
        assert_eq!(format_number("0"), "0");
    }
}
