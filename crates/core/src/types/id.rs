//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types, plus the [`LineKey`]
//! value that uniquely addresses a cart line.

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use golden_fig_core::define_id;
/// define_id!(ProductId);
/// define_id!(CustomerId);
///
/// let product_id = ProductId::new(1);
/// let customer_id = CustomerId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: ProductId = customer_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(ProductId);
define_id!(VariationId);
define_id!(CustomerId);

/// The identity of a cart line: a parent product plus an optional variation.
///
/// Two lines that differ only in variation are distinct lines, so the key is
/// the pair, not the product alone. On the wire a missing variation is encoded
/// as variation id `0`; [`LineKey::new`] normalizes that to `None` so the two
/// encodings compare equal everywhere (merge, dedup, lookup).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    product_id: ProductId,
    variation_id: Option<VariationId>,
}

impl LineKey {
    /// Create a line key, normalizing variation id `0` to "no variation".
    #[must_use]
    pub fn new(product_id: ProductId, variation_id: Option<VariationId>) -> Self {
        Self {
            product_id,
            variation_id: variation_id.filter(|v| v.as_i64() != 0),
        }
    }

    /// Key for a simple (non-variation) product line.
    #[must_use]
    pub const fn simple(product_id: ProductId) -> Self {
        Self {
            product_id,
            variation_id: None,
        }
    }

    /// Key for a variation line.
    #[must_use]
    pub fn with_variation(product_id: ProductId, variation_id: VariationId) -> Self {
        Self::new(product_id, Some(variation_id))
    }

    /// The parent product id.
    #[must_use]
    pub const fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// The variation id, if this line is a variation.
    #[must_use]
    pub const fn variation_id(&self) -> Option<VariationId> {
        self.variation_id
    }
}

impl core::fmt::Display for LineKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.variation_id {
            Some(variation) => write!(f, "{}:{}", self.product_id, variation),
            None => write!(f, "{}", self.product_id),
        }
    }
}
