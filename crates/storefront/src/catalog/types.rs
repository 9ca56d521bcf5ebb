//! Domain types for the store catalog.

use serde::{Deserialize, Serialize};

use golden_fig_core::{ProductId, VariationId};

/// Product or variation image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Image URL.
    pub src: String,
    /// Alt text for accessibility.
    #[serde(default)]
    pub alt: Option<String>,
}

/// Canonical product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Product id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Unit price as a major-unit decimal string (e.g., "19.99").
    pub price: String,
    /// Gallery images, first image is the primary one.
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Remaining stock when the product is flagged low, `None` otherwise.
    #[serde(default)]
    pub low_stock_remaining: Option<u32>,
    /// Whether new orders are fulfilled on backorder.
    #[serde(default)]
    pub backordered: bool,
}

/// A purchasable variation of a parent product.
///
/// Variation-level values take precedence over the parent product's when a
/// cart line names a variation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    /// Variation id (distinct from the parent product id).
    pub id: VariationId,
    /// Unit price as a major-unit decimal string.
    pub price: String,
    /// Variation-specific image, if any.
    #[serde(default)]
    pub image: Option<ProductImage>,
    /// Remaining stock when the variation is flagged low, `None` otherwise.
    #[serde(default)]
    pub low_stock_remaining: Option<u32>,
    /// Whether new orders are fulfilled on backorder.
    #[serde(default)]
    pub backordered: bool,
}
