//! Exact decimal amounts over integer sub-units.
//!
//! User input is parsed straight into sub-units without going through
//! floating point, so `"3.333333333333333333"` maps to exactly
//! `3_333333333333333333` wei.

use alloy_primitives::U256;
use thiserror::Error;

/// Reasons a textual amount is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,
    #[error("negative amounts are not allowed")]
    Negative,
    #[error("invalid amount: {0}")]
    Malformed(String),
    #[error("too many decimal places (max {0})")]
    TooPrecise(u8),
    #[error("amount does not fit in 256 bits")]
    Overflow,
}

/// Keep ASCII digits and the first decimal point, dropping everything else.
pub fn sanitize_amount_input(raw: &str) -> String {
    let mut seen_dot = false;
    raw.chars()
        .filter(|c| {
            if c.is_ascii_digit() {
                true
            } else if *c == '.' && !seen_dot {
                seen_dot = true;
                true
            } else {
                false
            }
        })
        .collect()
}

/// Parse a decimal string into sub-units with `decimals` fractional digits.
pub fn parse_amount(text: &str, decimals: u8) -> Result<U256, AmountError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AmountError::Empty);
    }
    if text.starts_with('-') {
        return Err(AmountError::Negative);
    }

    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, frac_part),
        None => (text, ""),
    };

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(AmountError::Malformed(text.to_string()));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(AmountError::Malformed(text.to_string()));
    }
    if frac_part.len() > decimals as usize {
        return Err(AmountError::TooPrecise(decimals));
    }

    let ten = U256::from(10u8);
    let mut value = U256::ZERO;
    let padding = decimals as usize - frac_part.len();
    let digits = int_part
        .bytes()
        .chain(frac_part.bytes())
        .chain(std::iter::repeat_n(b'0', padding));

    for digit in digits {
        value = value
            .checked_mul(ten)
            .and_then(|v| v.checked_add(U256::from(digit - b'0')))
            .ok_or(AmountError::Overflow)?;
    }

    Ok(value)
}

/// Exact decimal representation with trailing zeros trimmed.
pub fn format_amount(value: U256, decimals: u8) -> String {
    let (whole, frac) = split_digits(value, decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole
    } else {
        format!("{}.{}", whole, frac)
    }
}

/// Decimal representation truncated to `places` fractional digits.
pub fn format_amount_fixed(value: U256, decimals: u8, places: u8) -> String {
    let (whole, frac) = split_digits(value, decimals);
    if places == 0 {
        return whole;
    }
    let mut frac: String = frac.chars().take(places as usize).collect();
    while frac.len() < places as usize {
        frac.push('0');
    }
    format!("{}.{}", whole, frac)
}

/// Split into whole and zero-padded fractional digit strings.
fn split_digits(value: U256, decimals: u8) -> (String, String) {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return (digits, String::new());
    }
    let padded = if digits.len() <= decimals {
        format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
    } else {
        digits
    };
    let split = padded.len() - decimals;
    (padded[..split].to_string(), padded[split..].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ETHER: u128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_sanitize_strips_letters_and_extra_dots() {
        assert_eq!(sanitize_amount_input("12a.3b"), "12.3");
        assert_eq!(sanitize_amount_input("1.2.3"), "1.23");
        assert_eq!(sanitize_amount_input("-5"), "5");
        assert_eq!(sanitize_amount_input(" 1,000.5 "), "1000.5");
        assert_eq!(sanitize_amount_input(""), "");
    }

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(parse_amount("1", 18).unwrap(), U256::from(ETHER));
        assert_eq!(parse_amount("1.5", 18).unwrap(), U256::from(ETHER * 3 / 2));
        assert_eq!(parse_amount(".5", 18).unwrap(), U256::from(ETHER / 2));
        assert_eq!(parse_amount("2.", 18).unwrap(), U256::from(ETHER * 2));
        assert_eq!(parse_amount("0", 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_full_precision() {
        assert_eq!(
            parse_amount("3.333333333333333333", 18).unwrap(),
            U256::from(3_333_333_333_333_333_333u128)
        );
        assert_eq!(parse_amount("0.000000000000000001", 18).unwrap(), U256::from(1u8));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert_eq!(parse_amount("", 18), Err(AmountError::Empty));
        assert_eq!(parse_amount("   ", 18), Err(AmountError::Empty));
        assert_eq!(parse_amount("-1", 18), Err(AmountError::Negative));
        assert!(matches!(parse_amount(".", 18), Err(AmountError::Malformed(_))));
        assert!(matches!(parse_amount("1.2.3", 18), Err(AmountError::Malformed(_))));
        assert!(matches!(parse_amount("abc", 18), Err(AmountError::Malformed(_))));
        assert_eq!(
            parse_amount("0.0000000000000000001", 18),
            Err(AmountError::TooPrecise(18))
        );
    }

    #[test]
    fn test_parse_overflow() {
        let huge = "9".repeat(100);
        assert_eq!(parse_amount(&huge, 18), Err(AmountError::Overflow));
    }

    #[test]
    fn test_format_trims_trailing_zeros() {
        assert_eq!(format_amount(U256::from(ETHER), 18), "1");
        assert_eq!(format_amount(U256::from(ETHER * 3 / 2), 18), "1.5");
        assert_eq!(format_amount(U256::from(1u8), 18), "0.000000000000000001");
        assert_eq!(format_amount(U256::ZERO, 18), "0");
        assert_eq!(format_amount(U256::from(1234u32), 0), "1234");
    }

    #[test]
    fn test_format_preserves_full_precision() {
        let value = U256::from(3_333_333_333_333_333_333u128);
        assert_eq!(format_amount(value, 18), "3.333333333333333333");
        assert_eq!(parse_amount(&format_amount(value, 18), 18).unwrap(), value);
    }

    #[test]
    fn test_format_fixed_truncates() {
        let value = U256::from(1_234_567_800_000_000_000u128);
        assert_eq!(format_amount_fixed(value, 18, 4), "1.2345");
        assert_eq!(format_amount_fixed(U256::ZERO, 18, 4), "0.0000");
        assert_eq!(format_amount_fixed(value, 18, 0), "1");
        assert_eq!(format_amount_fixed(U256::from(5u8), 2, 4), "0.0500");
    }
}
