//! Cart state, reconciliation, and projection.
//!
//! # Architecture
//!
//! - Two backend adapters own the remote cart resources: the session cart
//!   (anonymous, fully priced, minor units) and the account cart (signed-in,
//!   identities and quantities only)
//! - [`merge_carts`] reconciles the two exactly once, on the sign-in edge
//! - [`normalize_cart`] converts session payloads to major-unit money
//! - [`DisplayProjector`] enriches account cart lines via catalog lookups
//! - [`CartEngine`] orchestrates all of the above and publishes the
//!   [`CartSnapshot`] read model

pub mod account;
pub mod engine;
pub mod merge;
pub mod normalize;
pub mod projector;
pub mod session;
pub mod types;

pub use account::{AccountCartBackend, HttpAccountCart};
pub use engine::{CartEngine, CartSnapshot};
pub use merge::merge_carts;
pub use normalize::normalize_cart;
pub use projector::DisplayProjector;
pub use session::{HttpSessionCart, SessionCartBackend};
pub use types::{
    AnonymousCart, AnonymousCartItem, AnonymousCartTotals, AppliedCoupon, DisplayCart,
    DisplayLine, ItemPrices, RawCart, RawCartItem,
};
