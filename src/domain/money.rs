use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fraction digits an amount is rounded to when recorded.
pub const CURRENCY_PRECISION: u32 = 2;

/// Largest amount a single expense may carry (one trillion). Sums over any
/// realistic number of expenses stay far below `Decimal::MAX`.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Round an amount to whole cents, half-up on the cent boundary.
/// Example: 19.999 -> 20.00, 0.125 -> 0.13
pub fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(CURRENCY_PRECISION, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount as a human-readable currency string with two fraction digits.
/// Only presentation rounds; stored values keep their full precision.
/// Example: 400 -> "400.00", 26.666... -> "26.67", -12.5 -> "-12.50"
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_to_cents(amount))
}

/// Format a signed balance with an explicit `+` for non-negative values.
pub fn format_signed(amount: Decimal) -> String {
    let formatted = format_amount(amount);
    if amount.is_sign_negative() && !amount.is_zero() {
        formatted
    } else {
        format!("+{}", formatted)
    }
}

/// Parse a decimal string into an amount, without rounding.
/// Example: "50.00" -> 50.00, "12.5" -> 12.5, ".50" -> 0.50, "19.999" -> 19.999
pub fn parse_amount(input: &str) -> Result<Decimal, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    // Leading-dot forms (".5", "-.5") are accepted like a form field would.
    let normalized = match input.strip_prefix('-') {
        Some(rest) if rest.starts_with('.') => format!("-0{}", rest),
        _ if input.starts_with('.') => format!("0{}", input),
        _ => input.to_string(),
    };

    Decimal::from_str(&normalized).map_err(|_| ParseAmountError::InvalidFormat)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Empty,
    InvalidFormat,
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Empty => write!(f, "empty amount"),
            ParseAmountError::InvalidFormat => write!(f, "invalid money format"),
        }
    }
}

impl std::error::Error for ParseAmountError {}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(dec!(19.999)), dec!(20.00));
        assert_eq!(round_to_cents(dec!(0.125)), dec!(0.13));
        assert_eq!(round_to_cents(dec!(0.124)), dec!(0.12));
        assert_eq!(round_to_cents(dec!(12.34)), dec!(12.34));
        assert_eq!(round_to_cents(dec!(0.004)), dec!(0.00));
    }

    #[test]
    fn test_max_amount() {
        assert_eq!(MAX_AMOUNT, dec!(1000000000000));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(400)), "400.00");
        assert_eq!(format_amount(dec!(12.5)), "12.50");
        assert_eq!(format_amount(dec!(0.01)), "0.01");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
        assert_eq!(format_amount(dec!(80) / dec!(3)), "26.67");
        assert_eq!(format_amount(dec!(-12.5)), "-12.50");
    }

    #[test]
    fn test_format_signed() {
        assert_eq!(format_signed(dec!(800)), "+800.00");
        assert_eq!(format_signed(Decimal::ZERO), "+0.00");
        assert_eq!(format_signed(dec!(-75)), "-75.00");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50.00"), Ok(dec!(50.00)));
        assert_eq!(parse_amount("50"), Ok(dec!(50)));
        assert_eq!(parse_amount(" 12.5 "), Ok(dec!(12.5)));
        assert_eq!(parse_amount(".50"), Ok(dec!(0.50)));
        assert_eq!(parse_amount("-.5"), Ok(dec!(-0.5)));
        assert_eq!(parse_amount("19.999"), Ok(dec!(19.999))); // Not rounded here
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert_eq!(parse_amount(""), Err(ParseAmountError::Empty));
        assert_eq!(parse_amount("   "), Err(ParseAmountError::Empty));
        assert!(parse_amount("abc").is_err());
        assert!(parse_amount("12.34.56").is_err());
    }
}
