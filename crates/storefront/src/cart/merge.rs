//! The one-time cart merge at sign-in.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use golden_fig_core::LineKey;

use super::types::{AnonymousCart, RawCart, RawCartItem};

/// Combine the pre-login session cart with the account cart loaded at
/// sign-in.
///
/// The result contains exactly the union of both carts' line identities.
/// Account lines keep their position; lines present only in the session cart
/// are appended in their own order. On a conflicting identity the session
/// quantity overwrites the account quantity - the device performing the
/// sign-in carries the shopper's latest intent, while the server state may be
/// stale. Quantities are never summed.
///
/// Pure and total over all input shapes; the caller supplies the timestamp
/// stamped on the merged cart so the function stays deterministic.
#[must_use]
pub fn merge_carts(
    session: &AnonymousCart,
    account: &RawCart,
    merged_at: DateTime<Utc>,
) -> RawCart {
    let mut order: Vec<LineKey> = Vec::new();
    let mut quantities: HashMap<LineKey, u32> = HashMap::new();

    // Seed with the account lines, then let the session overwrite
    for item in &account.items {
        let key = item.key();
        if quantities.insert(key, item.quantity).is_none() {
            order.push(key);
        }
    }
    for item in &session.items {
        let key = item.line_key();
        if quantities.insert(key, item.quantity).is_none() {
            order.push(key);
        }
    }

    RawCart {
        items: order
            .into_iter()
            .map(|key| RawCartItem {
                product_id: key.product_id(),
                variation_id: key.variation_id(),
                quantity: quantities.get(&key).copied().unwrap_or_default(),
            })
            .collect(),
        updated_at: Some(merged_at),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::types::{AnonymousCartItem, AnonymousCartTotals, ItemPrices};
    use golden_fig_core::{ProductId, VariationId};

    fn session_cart(items: Vec<(i64, i64, u32)>) -> AnonymousCart {
        AnonymousCart {
            cart_token: "tok".to_string(),
            currency: "USD".to_string(),
            item_count: items.iter().map(|(_, _, q)| q).sum(),
            items: items
                .into_iter()
                .map(|(id, parent_id, quantity)| AnonymousCartItem {
                    key: format!("line-{id}"),
                    id,
                    parent_id,
                    name: format!("Item {id}"),
                    quantity,
                    image: None,
                    prices: ItemPrices::default(),
                    low_stock_remaining: None,
                    backordered: false,
                })
                .collect(),
            coupons: Vec::new(),
            totals: AnonymousCartTotals::default(),
        }
    }

    fn account_cart(items: Vec<(i64, Option<i64>, u32)>) -> RawCart {
        RawCart {
            items: items
                .into_iter()
                .map(|(product_id, variation_id, quantity)| RawCartItem {
                    product_id: ProductId::new(product_id),
                    variation_id: variation_id.map(VariationId::new),
                    quantity,
                })
                .collect(),
            updated_at: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_merge_is_union_of_line_identities() {
        let session = session_cart(vec![(10, 10, 2), (20, 20, 1)]);
        let account = account_cart(vec![(20, None, 5), (30, None, 4)]);

        let merged = merge_carts(&session, &account, now());

        let keys: Vec<_> = merged.items.iter().map(RawCartItem::key).collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&LineKey::simple(ProductId::new(10))));
        assert!(keys.contains(&LineKey::simple(ProductId::new(20))));
        assert!(keys.contains(&LineKey::simple(ProductId::new(30))));
    }

    #[test]
    fn test_session_quantity_wins_on_conflict() {
        // Session has 2, account has 5: the merged quantity is 2, not 7, not 5
        let session = session_cart(vec![(10, 10, 2)]);
        let account = account_cart(vec![(10, None, 5)]);

        let merged = merge_carts(&session, &account, now());

        assert_eq!(merged.items.len(), 1);
        assert_eq!(merged.items.first().map(|i| i.quantity), Some(2));
    }

    #[test]
    fn test_empty_session_leaves_account_unchanged() {
        let session = session_cart(vec![]);
        let account = account_cart(vec![(10, None, 3), (20, Some(42), 1)]);

        let merged = merge_carts(&session, &account, now());

        assert_eq!(merged.items, account.items);
    }

    #[test]
    fn test_empty_account_adopts_translated_session_lines() {
        // Line 42 reports parent 10: it must translate to product 10, variation 42
        let session = session_cart(vec![(42, 10, 2), (20, 20, 1)]);
        let account = account_cart(vec![]);

        let merged = merge_carts(&session, &account, now());

        assert_eq!(
            merged.items,
            vec![
                RawCartItem {
                    product_id: ProductId::new(10),
                    variation_id: Some(VariationId::new(42)),
                    quantity: 2,
                },
                RawCartItem {
                    product_id: ProductId::new(20),
                    variation_id: None,
                    quantity: 1,
                },
            ]
        );
    }

    #[test]
    fn test_variation_lines_stay_distinct_from_simple_lines() {
        // Same parent product, one simple line and one variation line
        let session = session_cart(vec![(42, 10, 2)]);
        let account = account_cart(vec![(10, None, 5)]);

        let merged = merge_carts(&session, &account, now());

        assert_eq!(merged.items.len(), 2);
    }

    #[test]
    fn test_both_empty_yields_empty_cart() {
        let stamped = now();
        let merged = merge_carts(&session_cart(vec![]), &account_cart(vec![]), stamped);
        assert!(merged.is_empty());
        assert_eq!(merged.updated_at, Some(stamped));
    }

    #[test]
    fn test_merge_is_deterministic() {
        let session = session_cart(vec![(10, 10, 2), (42, 20, 1)]);
        let account = account_cart(vec![(30, None, 4)]);
        let stamped = now();

        assert_eq!(
            merge_carts(&session, &account, stamped),
            merge_carts(&session, &account, stamped)
        );
    }
}
