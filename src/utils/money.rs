//! Money formatting
//!
//! All monetary amounts are stored as integer fils (1 KWD = 1000 fils).
//! Formatting is integer math only; floats never touch money.

/// Fils per dinar
pub const FILS_PER_KWD: i64 = 1000;

/// Format fils as a decimal amount with three fractional digits, e.g. `12.500`.
pub fn format_fils(fils: i64) -> String {
    let sign = if fils < 0 { "-" } else { "" };
    let abs = fils.abs();
    format!("{sign}{}.{:03}", abs / FILS_PER_KWD, abs % FILS_PER_KWD)
}

/// Format fils with the currency code, e.g. `KWD 12.500`.
pub fn format_amount(currency: &str, fils: i64) -> String {
    format!("{currency} {}", format_fils(fils))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_fractional_digits() {
        assert_eq!(format_fils(0), "0.000");
        assert_eq!(format_fils(5), "0.005");
        assert_eq!(format_fils(500), "0.500");
        assert_eq!(format_fils(12500), "12.500");
        assert_eq!(format_fils(15000), "15.000");
    }

    #[test]
    fn negative_amounts() {
        assert_eq!(format_fils(-2500), "-2.500");
    }

    #[test]
    fn with_currency_code() {
        assert_eq!(format_amount("KWD", 17250), "KWD 17.250");
    }
}
