//! Golden Fig Storefront - Cart reconciliation engine.
//!
//! This crate presents one coherent shopping cart to a UI regardless of
//! whether the shopper is anonymous or signed in. Anonymous shoppers mutate a
//! server-side session cart that comes back fully priced; signed-in shoppers
//! mutate a durable per-account cart that stores only line identities and
//! quantities, re-priced on every read by joining against the live catalog.
//!
//! # Architecture
//!
//! - [`cart::CartEngine`] owns all cart state and is the single writer of the
//!   UI-facing [`cart::CartSnapshot`] read model (a `tokio::sync::watch`
//!   channel - subscribe with [`cart::CartEngine::subscribe`])
//! - [`cart::SessionCartBackend`] / [`cart::AccountCartBackend`] are the two
//!   cart stores; exactly one is live at a time, selected by identity
//! - [`catalog::CatalogLookup`] is the read-only product/variation source the
//!   display projector joins against
//! - The sign-in edge reconciles both carts exactly once via
//!   [`cart::merge_carts`], then destroys the session cart
//!
//! # Example
//!
//! ```rust,ignore
//! use golden_fig_storefront::cart::{CartEngine, HttpAccountCart, HttpSessionCart};
//! use golden_fig_storefront::catalog::HttpCatalog;
//! use golden_fig_storefront::config::StorefrontConfig;
//!
//! let config = StorefrontConfig::from_env()?;
//! let engine = CartEngine::new(
//!     HttpSessionCart::new(&config.store_api)?,
//!     HttpAccountCart::new(&config.store_api, credentials)?,
//!     HttpCatalog::new(&config.store_api)?,
//!     &config.currency,
//! );
//!
//! let mut snapshots = engine.subscribe();
//! engine.refresh().await?;
//! engine.add_item(ProductId::new(10), 2, None).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;

mod http;
