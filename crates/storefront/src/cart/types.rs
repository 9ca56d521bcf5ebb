//! Domain types for the two cart stores and the UI-facing display cart.
//!
//! Exactly one of the two backend shapes is live at a time, selected by the
//! current identity. The display cart is derived, never mutated directly: it
//! is recomputed from the account cart via the projector, or converted from
//! the (normalized) session cart in a pure pass.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use golden_fig_core::{LineKey, ProductId, VariationId};

// =============================================================================
// Account (raw) cart
// =============================================================================

/// A single line of the durable account cart.
///
/// This is the only persisted shape for a signed-in shopper: line identity
/// plus quantity, no pricing. Prices are never trusted from this store - they
/// are re-derived from the catalog on every projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCartItem {
    /// Parent product id.
    pub product_id: ProductId,
    /// Variation id when the line is a variation of the product.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variation_id: Option<VariationId>,
    /// Always a positive integer; quantity zero is a removal, not a line.
    pub quantity: u32,
}

impl RawCartItem {
    /// The line identity used for merge, dedup, and lookup.
    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id, self.variation_id)
    }
}

/// The durable account cart, cached by the engine and mutated through
/// full-replace writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawCart {
    /// Cart lines, unique by [`RawCartItem::key`].
    pub items: Vec<RawCartItem>,
    /// Server-side modification timestamp, absent on a never-written cart.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RawCart {
    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Session (anonymous) cart
// =============================================================================

/// Monetary fields of one session cart line.
///
/// The backend reports integer minor-unit strings; after the normalization
/// pass these are major-unit decimal strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPrices {
    /// Unit price.
    pub unit: String,
    /// Line subtotal before tax and discounts.
    pub subtotal: String,
    /// Line total.
    pub total: String,
    /// Line tax.
    pub tax: String,
}

/// One line of the session cart as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousCartItem {
    /// The backend's opaque line key.
    pub key: String,
    /// The purchased catalog entry: the variation id when the line is a
    /// variation, otherwise the product id.
    pub id: i64,
    /// Parent product id; equals `id` for non-variation lines.
    pub parent_id: i64,
    /// Display name.
    pub name: String,
    /// Line quantity.
    pub quantity: u32,
    /// Line image URL, if any.
    #[serde(default)]
    pub image: Option<String>,
    /// Monetary fields, see [`ItemPrices`].
    pub prices: ItemPrices,
    /// Remaining stock when flagged low, `None` otherwise.
    #[serde(default)]
    pub low_stock_remaining: Option<u32>,
    /// Whether the line is fulfilled on backorder.
    #[serde(default)]
    pub backordered: bool,
}

impl AnonymousCartItem {
    /// The line identity.
    ///
    /// A line is a variation only when the backend's reported id differs from
    /// the reported parent product id; in that case the variation id is the
    /// reported id and the product id is the parent.
    #[must_use]
    pub fn line_key(&self) -> LineKey {
        if self.id == self.parent_id {
            LineKey::simple(ProductId::new(self.parent_id))
        } else {
            LineKey::with_variation(ProductId::new(self.parent_id), VariationId::new(self.id))
        }
    }
}

/// A coupon applied to the session cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedCoupon {
    /// Coupon code.
    pub code: String,
    /// Discounted amount (minor units until normalized).
    pub amount: String,
}

/// Aggregate totals of the session cart (minor units until normalized).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousCartTotals {
    /// Sum of line subtotals.
    pub subtotal: String,
    /// Total tax.
    pub tax: String,
    /// Total discount from coupons.
    pub discount: String,
    /// Grand total.
    pub total: String,
}

/// The self-contained session cart returned wholesale by the anonymous
/// backend.
///
/// The engine treats this as opaque except for the normalization pass and for
/// extracting line identities during the sign-in merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousCart {
    /// Token addressing the session cart resource across requests.
    pub cart_token: String,
    /// ISO 4217 currency code for every monetary field.
    pub currency: String,
    /// Cart lines.
    pub items: Vec<AnonymousCartItem>,
    /// Sum of line quantities.
    pub item_count: u32,
    /// Applied coupons.
    #[serde(default)]
    pub coupons: Vec<AppliedCoupon>,
    /// Aggregate totals.
    pub totals: AnonymousCartTotals,
}

impl AnonymousCart {
    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Display cart
// =============================================================================

/// One enriched line of the UI-facing cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayLine {
    /// Line identity, also the reference for mutations.
    pub key: LineKey,
    /// Display name.
    pub name: String,
    /// Image URL, if any.
    pub image: Option<String>,
    /// Line quantity.
    pub quantity: u32,
    /// Unit price as a major-unit decimal string.
    pub unit_price: String,
    /// Line subtotal as a major-unit decimal string.
    pub subtotal: String,
    /// Remaining stock when flagged low, `None` otherwise.
    pub low_stock_remaining: Option<u32>,
    /// Whether the line is fulfilled on backorder.
    pub backordered: bool,
}

impl DisplayLine {
    /// Whether the line should show a low-stock warning.
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.low_stock_remaining.is_some()
    }
}

/// The UI-facing cart projection.
///
/// Monetary fields are always major-unit decimal strings with a consistent
/// currency; minor-unit values never reach this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayCart {
    /// Enriched lines.
    pub lines: Vec<DisplayLine>,
    /// Sum of line quantities.
    pub item_count: u32,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Sum of line subtotals.
    pub subtotal: String,
    /// Grand total.
    pub total: String,
}

impl DisplayCart {
    /// The canonical empty cart: zero lines, zero totals.
    #[must_use]
    pub fn empty(currency: &str) -> Self {
        Self {
            lines: Vec::new(),
            item_count: 0,
            currency: currency.to_string(),
            subtotal: "0.00".to_string(),
            total: "0.00".to_string(),
        }
    }
}

impl From<&AnonymousCart> for DisplayCart {
    /// Pure conversion from a *normalized* session cart.
    ///
    /// The session backend already returns enriched data, so no catalog
    /// projection happens on this path.
    fn from(cart: &AnonymousCart) -> Self {
        Self {
            lines: cart.items.iter().map(DisplayLine::from).collect(),
            item_count: cart.item_count,
            currency: cart.currency.clone(),
            subtotal: cart.totals.subtotal.clone(),
            total: cart.totals.total.clone(),
        }
    }
}

impl From<&AnonymousCartItem> for DisplayLine {
    fn from(item: &AnonymousCartItem) -> Self {
        Self {
            key: item.line_key(),
            name: item.name.clone(),
            image: item.image.clone(),
            quantity: item.quantity,
            unit_price: item.prices.unit.clone(),
            subtotal: item.prices.subtotal.clone(),
            low_stock_remaining: item.low_stock_remaining,
            backordered: item.backordered,
        }
    }
}
