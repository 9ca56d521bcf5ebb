//! Money helpers built on decimal arithmetic.
//!
//! Monetary amounts cross module boundaries as strings: the session cart
//! backend reports integer minor units (`"1999"` cents), the catalog reports
//! major-unit decimals (`"19.99"`), and everything UI-facing is a major-unit
//! decimal string rounded to two places. These helpers are the only place the
//! conversions live.

use rust_decimal::Decimal;

/// Convert an integer minor-unit string to a major-unit decimal string.
///
/// `"1999"` becomes `"19.99"`. Returns `None` when the input is not a
/// well-formed integer string; callers are expected to leave such fields
/// unchanged rather than fail.
#[must_use]
pub fn minor_to_major(minor: &str) -> Option<String> {
    let units: i64 = minor.parse().ok()?;
    Some(Decimal::new(units, 2).to_string())
}

/// Parse a major-unit decimal string, e.g. `"19.99"`.
#[must_use]
pub fn parse_amount(amount: &str) -> Option<Decimal> {
    amount.parse().ok()
}

/// Format an amount as a two-place decimal string, e.g. `"0.00"`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Line subtotal: unit price times quantity.
///
/// An unparseable unit price counts as zero, matching the degraded-line
/// fallback used by the display projector.
#[must_use]
pub fn line_subtotal(unit_price: &str, quantity: u32) -> Decimal {
    parse_amount(unit_price).unwrap_or_default() * Decimal::from(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minor_to_major() {
        assert_eq!(minor_to_major("1999").as_deref(), Some("19.99"));
        assert_eq!(minor_to_major("100").as_deref(), Some("1.00"));
        assert_eq!(minor_to_major("5").as_deref(), Some("0.05"));
        assert_eq!(minor_to_major("0").as_deref(), Some("0.00"));
    }

    #[test]
    fn test_minor_to_major_rejects_malformed() {
        assert_eq!(minor_to_major("19.99"), None);
        assert_eq!(minor_to_major(""), None);
        assert_eq!(minor_to_major("abc"), None);
        assert_eq!(minor_to_major("19 99"), None);
    }

    #[test]
    fn test_minor_to_major_round_trip() {
        // For any well-formed minor-unit string, converting and scaling back
        // by 100 recovers the original value.
        for minor in ["1", "99", "100", "123456789"] {
            let major = minor_to_major(minor).expect("well-formed input");
            let recovered = parse_amount(&major).expect("decimal output") * Decimal::from(100);
            assert_eq!(recovered, minor.parse::<i64>().expect("integer").into());
        }
    }

    #[test]
    fn test_format_amount_pads_and_rounds() {
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
        assert_eq!(format_amount(Decimal::new(5, 1)), "0.50");
        assert_eq!(format_amount(Decimal::new(19994, 3)), "19.99");
    }

    #[test]
    fn test_line_subtotal() {
        assert_eq!(format_amount(line_subtotal("19.99", 3)), "59.97");
        assert_eq!(format_amount(line_subtotal("0", 5)), "0.00");
        assert_eq!(format_amount(line_subtotal("not-a-price", 2)), "0.00");
    }
}
