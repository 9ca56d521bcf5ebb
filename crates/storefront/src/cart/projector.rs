//! Display projection of the account cart.
//!
//! The account cart stores only line identities and quantities, so every
//! re-projection joins each line against the live catalog: one product fetch
//! per line, plus a variation-list fetch when the line names a variation. The
//! per-line lookups are independent reads and run concurrently.

use futures::future::join_all;
use rust_decimal::Decimal;
use tracing::warn;

use golden_fig_core::{format_amount, line_subtotal, parse_amount};

use crate::catalog::CatalogLookup;

use super::types::{DisplayCart, DisplayLine, RawCart, RawCartItem};

/// Projects raw account cart lines into the UI-facing display cart.
pub struct DisplayProjector<C> {
    catalog: C,
    currency: String,
}

impl<C: CatalogLookup> DisplayProjector<C> {
    /// Create a projector over the given catalog.
    ///
    /// `currency` is the store currency stamped on every projected cart; the
    /// account cart wire carries no monetary fields at all.
    pub fn new(catalog: C, currency: impl Into<String>) -> Self {
        Self {
            catalog,
            currency: currency.into(),
        }
    }

    /// The catalog this projector joins against.
    pub const fn catalog(&self) -> &C {
        &self.catalog
    }

    /// The store currency stamped on projected carts.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Project a raw cart into a display cart.
    ///
    /// A per-line catalog failure degrades that line to fallback fields; it
    /// never aborts the whole projection. An empty input projects to the
    /// canonical empty cart, not an absent one.
    pub async fn project(&self, raw: &RawCart) -> DisplayCart {
        let lines = join_all(raw.items.iter().map(|item| self.project_line(item))).await;

        let subtotal: Decimal = lines
            .iter()
            .filter_map(|line| parse_amount(&line.subtotal))
            .sum();

        DisplayCart {
            item_count: lines.iter().map(|line| line.quantity).sum(),
            lines,
            currency: self.currency.clone(),
            subtotal: format_amount(subtotal),
            total: format_amount(subtotal),
        }
    }

    async fn project_line(&self, item: &RawCartItem) -> DisplayLine {
        let product = match self.catalog.product_by_id(item.product_id).await {
            Ok(product) => Some(product),
            Err(err) => {
                warn!(
                    product_id = %item.product_id,
                    error = %err,
                    "catalog lookup failed, projecting degraded line"
                );
                None
            }
        };

        let variation = match item.variation_id {
            Some(variation_id) => {
                match self.catalog.variations_by_product_id(item.product_id).await {
                    Ok(variations) => {
                        let found = variations.into_iter().find(|v| v.id == variation_id);
                        if found.is_none() {
                            warn!(
                                product_id = %item.product_id,
                                variation_id = %variation_id,
                                "variation missing from catalog list"
                            );
                        }
                        found
                    }
                    Err(err) => {
                        warn!(
                            product_id = %item.product_id,
                            error = %err,
                            "variation lookup failed, using product-level fields"
                        );
                        None
                    }
                }
            }
            None => None,
        };

        // Resolution priority: variation-level values, then product-level,
        // then the degraded fallbacks
        let name = product.as_ref().map_or_else(
            || format!("Product {}", item.product_id),
            |p| p.name.clone(),
        );
        let image = variation
            .as_ref()
            .and_then(|v| v.image.as_ref())
            .map(|i| i.src.clone())
            .or_else(|| {
                product
                    .as_ref()
                    .and_then(|p| p.images.first())
                    .map(|i| i.src.clone())
            });
        let unit_price = variation.as_ref().map_or_else(
            || {
                product
                    .as_ref()
                    .map_or_else(|| "0".to_string(), |p| p.price.clone())
            },
            |v| v.price.clone(),
        );
        let (low_stock_remaining, backordered) = variation.as_ref().map_or_else(
            || {
                product
                    .as_ref()
                    .map_or((None, false), |p| (p.low_stock_remaining, p.backordered))
            },
            |v| (v.low_stock_remaining, v.backordered),
        );

        DisplayLine {
            key: item.key(),
            name,
            image,
            quantity: item.quantity,
            subtotal: format_amount(line_subtotal(&unit_price, item.quantity)),
            unit_price,
            low_stock_remaining,
            backordered,
        }
    }
}
