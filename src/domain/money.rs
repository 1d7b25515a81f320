use std::fmt;

/// Money is represented as integer cents to avoid floating-point precision
/// issues. $50.00 = 5000 cents.
pub type Cents = i64;

/// Format cents as a dollar string with thousands separators.
/// Example: 123456 -> "$1,234.56", -99 -> "-$0.99"
pub fn format_usd(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.unsigned_abs();
    let units = abs_cents / 100;
    let remainder = abs_cents % 100;

    let digits = units.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}${}.{:02}", sign, grouped, remainder)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim().trim_start_matches('$');
    let negative = input.starts_with('-');
    let input = input.trim_start_matches('-');

    let parts: Vec<&str> = input.split('.').collect();
    match parts.len() {
        1 => {
            let units: i64 = parts[0]
                .parse()
                .map_err(|_| ParseCentsError::InvalidFormat)?;
            let cents = units.checked_mul(100).ok_or(ParseCentsError::OutOfRange)?;
            Ok(if negative { -cents } else { cents })
        }
        2 => {
            let units: i64 = if parts[0].is_empty() {
                0
            } else {
                parts[0]
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?
            };

            // Pad or truncate the decimal part to 2 digits
            let decimal_str = parts[1];
            if !decimal_str.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ParseCentsError::InvalidFormat);
            }
            let decimal_cents: i64 = match decimal_str.len() {
                0 => 0,
                1 => {
                    decimal_str
                        .parse::<i64>()
                        .map_err(|_| ParseCentsError::InvalidFormat)?
                        * 10
                }
                2 => decimal_str
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?,
                _ => decimal_str[..2]
                    .parse()
                    .map_err(|_| ParseCentsError::InvalidFormat)?,
            };

            let cents = units
                .checked_mul(100)
                .and_then(|c| c.checked_add(decimal_cents))
                .ok_or(ParseCentsError::OutOfRange)?;
            Ok(if negative { -cents } else { cents })
        }
        _ => Err(ParseCentsError::InvalidFormat),
    }
}

/// Convert a fractional dollar price from the quote source into cents,
/// rounding half away from zero. Returns None for NaN, infinities, or
/// values outside the i64 range.
pub fn cents_from_price(price: f64) -> Option<Cents> {
    if !price.is_finite() {
        return None;
    }
    let cents = (price * 100.0).round();
    if cents < i64::MIN as f64 || cents > i64::MAX as f64 {
        return None;
    }
    Some(cents as Cents)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    OutOfRange,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::OutOfRange => write!(f, "amount out of range"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
