//! Minor-unit normalization of session cart payloads.

use golden_fig_core::minor_to_major;

use super::types::AnonymousCart;

/// Normalize every monetary field of a session cart from integer minor-unit
/// strings to major-unit decimal strings.
///
/// Walks a fixed, explicit set of field paths: per-line prices, coupon
/// amounts, and cart totals. The input is not mutated; a deep copy is
/// returned. A field that is not a well-formed integer string is copied
/// through unchanged - partially-typed upstream payloads must not break the
/// cart.
#[must_use]
pub fn normalize_cart(cart: &AnonymousCart) -> AnonymousCart {
    let mut cart = cart.clone();

    for item in &mut cart.items {
        convert(&mut item.prices.unit);
        convert(&mut item.prices.subtotal);
        convert(&mut item.prices.total);
        convert(&mut item.prices.tax);
    }

    for coupon in &mut cart.coupons {
        convert(&mut coupon.amount);
    }

    convert(&mut cart.totals.subtotal);
    convert(&mut cart.totals.tax);
    convert(&mut cart.totals.discount);
    convert(&mut cart.totals.total);

    cart
}

fn convert(field: &mut String) {
    if let Some(major) = minor_to_major(field) {
        *field = major;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::types::{AnonymousCartItem, AnonymousCartTotals, AppliedCoupon, ItemPrices};

    fn minor_unit_cart() -> AnonymousCart {
        AnonymousCart {
            cart_token: "tok".to_string(),
            currency: "USD".to_string(),
            items: vec![AnonymousCartItem {
                key: "line-10".to_string(),
                id: 10,
                parent_id: 10,
                name: "Fig Jam".to_string(),
                quantity: 2,
                image: None,
                prices: ItemPrices {
                    unit: "1999".to_string(),
                    subtotal: "3998".to_string(),
                    total: "3998".to_string(),
                    tax: "0".to_string(),
                },
                low_stock_remaining: None,
                backordered: false,
            }],
            item_count: 2,
            coupons: vec![AppliedCoupon {
                code: "WELCOME".to_string(),
                amount: "500".to_string(),
            }],
            totals: AnonymousCartTotals {
                subtotal: "3998".to_string(),
                tax: "0".to_string(),
                discount: "500".to_string(),
                total: "3498".to_string(),
            },
        }
    }

    #[test]
    fn test_normalize_converts_all_monetary_paths() {
        let normalized = normalize_cart(&minor_unit_cart());

        let item = normalized.items.first().expect("one item");
        assert_eq!(item.prices.unit, "19.99");
        assert_eq!(item.prices.subtotal, "39.98");
        assert_eq!(item.prices.tax, "0.00");
        assert_eq!(
            normalized.coupons.first().map(|c| c.amount.as_str()),
            Some("5.00")
        );
        assert_eq!(normalized.totals.total, "34.98");
        assert_eq!(normalized.totals.discount, "5.00");
    }

    #[test]
    fn test_normalize_does_not_mutate_input() {
        let cart = minor_unit_cart();
        let before = cart.clone();
        let _ = normalize_cart(&cart);
        assert_eq!(cart, before);
    }

    #[test]
    fn test_normalize_leaves_malformed_fields_unchanged() {
        let mut cart = minor_unit_cart();
        if let Some(item) = cart.items.first_mut() {
            item.prices.unit = "n/a".to_string();
        }
        cart.totals.total = String::new();

        let normalized = normalize_cart(&cart);
        assert_eq!(
            normalized.items.first().map(|i| i.prices.unit.as_str()),
            Some("n/a")
        );
        assert_eq!(normalized.totals.total, "");
        // Well-formed siblings are still converted
        assert_eq!(normalized.totals.subtotal, "39.98");
    }

    #[test]
    fn test_normalize_preserves_non_monetary_fields() {
        let normalized = normalize_cart(&minor_unit_cart());
        assert_eq!(normalized.cart_token, "tok");
        assert_eq!(normalized.item_count, 2);
        assert_eq!(normalized.items.first().map(|i| i.quantity), Some(2));
    }
}
