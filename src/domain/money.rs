use thiserror::Error;

/// Money is represented as integer cents so every amount is an exact 2-dp value.
/// 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a plain decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;
    format!("{}{}.{:02}", sign, units, remainder)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseAmountError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must be a plain decimal number")]
    InvalidFormat,
    #[error("amount must have at most 2 decimal places")]
    TooManyDecimals,
    #[error("amount must be positive")]
    NotPositive,
    #[error("amount is too large")]
    Overflow,
}

/// Parse a caller-supplied amount into cents.
///
/// Accepts `"50"`, `"50.5"`, `"50.00"`, `"1.000"` and `".25"`. Anything that
/// would need rounding to reach 2 decimal places is rejected, and so are
/// signs, exponents and zero.
pub fn parse_amount(input: &str) -> Result<Cents, ParseAmountError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(ParseAmountError::Empty);
    }

    let (units_str, decimal_str) = match input.split_once('.') {
        Some((units, decimals)) => (units, Some(decimals)),
        None => (input, None),
    };

    if units_str.is_empty() && decimal_str.is_none_or(str::is_empty) {
        return Err(ParseAmountError::InvalidFormat);
    }
    if !units_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseAmountError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseAmountError::Overflow)?
    };

    let decimal_cents: i64 = match decimal_str {
        None => 0,
        Some(d) if !d.bytes().all(|b| b.is_ascii_digit()) => {
            return Err(ParseAmountError::InvalidFormat);
        }
        Some(d) => {
            // Digits past the second are only allowed when they change nothing
            let (kept, extra) = d.split_at(d.len().min(2));
            if extra.bytes().any(|b| b != b'0') {
                return Err(ParseAmountError::TooManyDecimals);
            }
            match kept.len() {
                0 => 0,
                // "12.5" means 12.50
                1 => kept.parse::<i64>().map_err(|_| ParseAmountError::InvalidFormat)? * 10,
                _ => kept.parse().map_err(|_| ParseAmountError::InvalidFormat)?,
            }
        }
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseAmountError::Overflow)?;

    if cents <= 0 {
        return Err(ParseAmountError::NotPositive);
    }
    Ok(cents)
}

/// A validated, strictly positive 2-dp amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Cents);

impl Amount {
    pub fn from_cents(cents: Cents) -> Result<Self, ParseAmountError> {
        if cents <= 0 {
            return Err(ParseAmountError::NotPositive);
        }
        Ok(Self(cents))
    }

    pub fn parse(input: &str) -> Result<Self, ParseAmountError> {
        parse_amount(input).map(Self)
    }

    pub fn cents(&self) -> Cents {
        self.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_cents(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-5000), "-50.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("50.00"), Ok(5000));
        assert_eq!(parse_amount("50"), Ok(5000));
        assert_eq!(parse_amount("12.34"), Ok(1234));
        assert_eq!(parse_amount("12.5"), Ok(1250));
        assert_eq!(parse_amount("0.01"), Ok(1));
        assert_eq!(parse_amount(".50"), Ok(50));
        assert_eq!(parse_amount("  20.00 "), Ok(2000));
        assert_eq!(parse_amount("7."), Ok(700));
        assert_eq!(parse_amount("1.000"), Ok(100));
        assert_eq!(parse_amount("2.5000"), Ok(250));
    }

    #[test]
    fn test_parse_amount_rejects_rounding() {
        assert_eq!(parse_amount("100.999"), Err(ParseAmountError::TooManyDecimals));
        assert_eq!(parse_amount("1.005"), Err(ParseAmountError::TooManyDecimals));
        assert_eq!(parse_amount("0.0010"), Err(ParseAmountError::TooManyDecimals));
    }

    #[test]
    fn test_parse_amount_rejects_non_positive() {
        assert_eq!(parse_amount("0"), Err(ParseAmountError::NotPositive));
        assert_eq!(parse_amount("0.00"), Err(ParseAmountError::NotPositive));
        assert_eq!(parse_amount("-5.00"), Err(ParseAmountError::InvalidFormat));
        assert_eq!(parse_amount("+5.00"), Err(ParseAmountError::InvalidFormat));
    }

    #[test]
    fn test_amount_newtype() {
        assert_eq!(Amount::parse("0.01").map(|a| a.cents()), Ok(1));
        assert_eq!(Amount::from_cents(0), Err(ParseAmountError::NotPositive));
        assert_eq!(Amount::from_cents(-10), Err(ParseAmountError::NotPositive));
        assert_eq!(Amount::from_cents(2000).unwrap().to_string(), "20.00");
    }

    #[test]
    fn test_parse_amount_invalid() {
        assert_eq!(parse_amount(""), Err(ParseAmountError::Empty));
        assert_eq!(parse_amount("   "), Err(ParseAmountError::Empty));
        assert_eq!(parse_amount("."), Err(ParseAmountError::InvalidFormat));
        assert_eq!(parse_amount("abc"), Err(ParseAmountError::InvalidFormat));
        assert_eq!(parse_amount("12.34.56"), Err(ParseAmountError::InvalidFormat));
        assert_eq!(parse_amount("1e3"), Err(ParseAmountError::InvalidFormat));
        assert_eq!(parse_amount("1.-5"), Err(ParseAmountError::InvalidFormat));
        assert_eq!(
            parse_amount("99999999999999999999"),
            Err(ParseAmountError::Overflow)
        );
    }
}
