//! Integration test harness for the Golden Fig cart engine.
//!
//! In-memory stand-ins for the three remote collaborators: a session cart
//! backend that prices lines itself (in minor units, like the real one), an
//! account cart store, and a small catalog. Each fake records its calls so
//! scenarios can assert exactly which backend operations a user action
//! produced, and can be switched into a failing mode to exercise the engine's
//! error paths.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p golden-fig-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use golden_fig_core::{LineKey, ProductId, VariationId};
use golden_fig_storefront::cart::{
    AccountCartBackend, AnonymousCart, AnonymousCartItem, AnonymousCartTotals, CartEngine,
    ItemPrices, RawCart, RawCartItem, SessionCartBackend,
};
use golden_fig_storefront::catalog::{CatalogLookup, Product, ProductImage, Variation};
use golden_fig_storefront::error::StoreApiError;

/// Engine wired to the three fakes.
pub type TestEngine = CartEngine<FakeSessionCart, FakeAccountCart, FakeCatalog>;

/// Build an engine over clones of the given fakes, keeping the originals
/// available for assertions.
#[must_use]
pub fn engine(
    session: &FakeSessionCart,
    account: &FakeAccountCart,
    catalog: &FakeCatalog,
) -> TestEngine {
    CartEngine::new(session.clone(), account.clone(), catalog.clone(), "USD")
}

static TRACING: Once = Once::new();

/// Initialize test logging once; honors `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info".into());
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    });
}

// =============================================================================
// Call recording
// =============================================================================

/// Per-method call counter shared by the fakes.
#[derive(Default)]
pub struct CallLog {
    counts: Mutex<HashMap<&'static str, u32>>,
}

impl CallLog {
    fn record(&self, method: &'static str) {
        let mut counts = self.counts.lock().expect("call log poisoned");
        *counts.entry(method).or_insert(0) += 1;
    }

    /// How many times `method` was invoked.
    #[must_use]
    pub fn count(&self, method: &str) -> u32 {
        self.counts
            .lock()
            .expect("call log poisoned")
            .get(method)
            .copied()
            .unwrap_or(0)
    }
}

// =============================================================================
// Session cart fake
// =============================================================================

const DEFAULT_MINOR_UNIT_PRICE: i64 = 1000;

#[derive(Default)]
struct SessionInner {
    prices: Mutex<HashMap<i64, i64>>,
    cart: Mutex<Option<AnonymousCart>>,
    failing: AtomicBool,
    latency: Mutex<Option<Duration>>,
    calls: CallLog,
}

/// In-memory session cart backend.
///
/// Returns full minor-unit cart payloads the way the real backend does;
/// prices default to 1000 minor units per catalog entry unless overridden.
#[derive(Clone, Default)]
pub struct FakeSessionCart {
    inner: Arc<SessionInner>,
}

impl FakeSessionCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the minor-unit price of a catalog entry (product or
    /// variation id).
    #[must_use]
    pub fn with_price(self, id: i64, minor_units: i64) -> Self {
        self.inner
            .prices
            .lock()
            .expect("prices poisoned")
            .insert(id, minor_units);
        self
    }

    /// Pre-seed the session cart with a line, as if the shopper added it
    /// before the test began.
    #[must_use]
    pub fn with_line(self, product_id: i64, variation_id: Option<i64>, quantity: u32) -> Self {
        self.upsert_line(
            ProductId::new(product_id),
            quantity,
            variation_id.map(VariationId::new),
        );
        self
    }

    /// Make every subsequent call fail with a 503.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent call, for in-flight ordering scenarios.
    pub fn set_latency(&self, latency: Duration) {
        *self.inner.latency.lock().expect("latency poisoned") = Some(latency);
    }

    /// The recorded calls.
    #[must_use]
    pub fn calls(&self) -> &CallLog {
        &self.inner.calls
    }

    /// Whether a session cart resource currently exists.
    #[must_use]
    pub fn has_cart(&self) -> bool {
        self.inner.cart.lock().expect("cart poisoned").is_some()
    }

    fn price_of(&self, id: i64) -> i64 {
        self.inner
            .prices
            .lock()
            .expect("prices poisoned")
            .get(&id)
            .copied()
            .unwrap_or(DEFAULT_MINOR_UNIT_PRICE)
    }

    async fn simulate(&self) -> Result<(), StoreApiError> {
        let latency = *self.inner.latency.lock().expect("latency poisoned");
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(StoreApiError::Status {
                status: 503,
                body: "session cart backend unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn upsert_line(
        &self,
        product_id: ProductId,
        quantity: u32,
        variation_id: Option<VariationId>,
    ) -> AnonymousCart {
        let id = variation_id.map_or(product_id.as_i64(), |variation| variation.as_i64());
        let parent_id = product_id.as_i64();
        self.mutate(|cart| {
            match cart
                .items
                .iter_mut()
                .find(|item| item.id == id && item.parent_id == parent_id)
            {
                Some(item) => item.quantity += quantity,
                None => cart.items.push(AnonymousCartItem {
                    key: format!("item-{id}"),
                    id,
                    parent_id,
                    name: format!("Item {id}"),
                    quantity,
                    image: None,
                    prices: ItemPrices::default(),
                    low_stock_remaining: None,
                    backordered: false,
                }),
            }
        })
    }

    /// Apply `f` to the cart (creating it lazily, like the real backend),
    /// then reprice and return the full payload.
    fn mutate(&self, f: impl FnOnce(&mut AnonymousCart)) -> AnonymousCart {
        let mut guard = self.inner.cart.lock().expect("cart poisoned");
        let cart = guard.get_or_insert_with(|| AnonymousCart {
            cart_token: Uuid::new_v4().to_string(),
            currency: "USD".to_string(),
            items: Vec::new(),
            item_count: 0,
            coupons: Vec::new(),
            totals: AnonymousCartTotals::default(),
        });
        f(cart);
        self.reprice(cart);
        cart.clone()
    }

    /// Recompute per-line and aggregate minor-unit totals.
    fn reprice(&self, cart: &mut AnonymousCart) {
        let mut subtotal: i64 = 0;
        for item in &mut cart.items {
            let unit = self.price_of(item.id);
            let line = unit * i64::from(item.quantity);
            item.prices = ItemPrices {
                unit: unit.to_string(),
                subtotal: line.to_string(),
                total: line.to_string(),
                tax: "0".to_string(),
            };
            subtotal += line;
        }
        cart.item_count = cart.items.iter().map(|item| item.quantity).sum();
        cart.totals = AnonymousCartTotals {
            subtotal: subtotal.to_string(),
            tax: "0".to_string(),
            discount: "0".to_string(),
            total: subtotal.to_string(),
        };
    }
}

#[async_trait]
impl SessionCartBackend for FakeSessionCart {
    async fn fetch(&self) -> Result<Option<AnonymousCart>, StoreApiError> {
        self.inner.calls.record("fetch");
        self.simulate().await?;
        Ok(self.inner.cart.lock().expect("cart poisoned").clone())
    }

    async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        variation_id: Option<VariationId>,
    ) -> Result<AnonymousCart, StoreApiError> {
        self.inner.calls.record("add_item");
        self.simulate().await?;
        Ok(self.upsert_line(product_id, quantity, variation_id))
    }

    async fn update_item(
        &self,
        key: LineKey,
        quantity: u32,
    ) -> Result<AnonymousCart, StoreApiError> {
        self.inner.calls.record("update_item");
        self.simulate().await?;
        Ok(self.mutate(|cart| {
            if let Some(item) = cart.items.iter_mut().find(|item| item.line_key() == key) {
                item.quantity = quantity;
            }
        }))
    }

    async fn remove_item(&self, key: LineKey) -> Result<AnonymousCart, StoreApiError> {
        self.inner.calls.record("remove_item");
        self.simulate().await?;
        Ok(self.mutate(|cart| cart.items.retain(|item| item.line_key() != key)))
    }

    async fn clear(&self) -> Result<AnonymousCart, StoreApiError> {
        self.inner.calls.record("clear");
        self.simulate().await?;
        Ok(self.mutate(|cart| cart.items.clear()))
    }

    async fn destroy(&self) -> Result<(), StoreApiError> {
        self.inner.calls.record("destroy");
        self.simulate().await?;
        *self.inner.cart.lock().expect("cart poisoned") = None;
        Ok(())
    }
}

// =============================================================================
// Account cart fake
// =============================================================================

#[derive(Default)]
struct AccountInner {
    cart: Mutex<Option<RawCart>>,
    failing: AtomicBool,
    calls: CallLog,
}

/// In-memory account cart backend: line identities and quantities only.
#[derive(Clone, Default)]
pub struct FakeAccountCart {
    inner: Arc<AccountInner>,
}

impl FakeAccountCart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the account cart with a line.
    #[must_use]
    pub fn with_line(self, product_id: i64, variation_id: Option<i64>, quantity: u32) -> Self {
        let mut guard = self.inner.cart.lock().expect("cart poisoned");
        let cart = guard.get_or_insert_with(RawCart::default);
        cart.items.push(RawCartItem {
            product_id: ProductId::new(product_id),
            variation_id: variation_id.map(VariationId::new),
            quantity,
        });
        drop(guard);
        self
    }

    /// Make every subsequent call fail with a 503.
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// The recorded calls.
    #[must_use]
    pub fn calls(&self) -> &CallLog {
        &self.inner.calls
    }

    /// The lines currently stored server-side.
    #[must_use]
    pub fn items(&self) -> Vec<RawCartItem> {
        self.inner
            .cart
            .lock()
            .expect("cart poisoned")
            .as_ref()
            .map(|cart| cart.items.clone())
            .unwrap_or_default()
    }

    fn check_failing(&self) -> Result<(), StoreApiError> {
        if self.inner.failing.load(Ordering::SeqCst) {
            return Err(StoreApiError::Status {
                status: 503,
                body: "account cart backend unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AccountCartBackend for FakeAccountCart {
    async fn fetch(&self) -> Result<RawCart, StoreApiError> {
        self.inner.calls.record("fetch");
        self.check_failing()?;
        Ok(self
            .inner
            .cart
            .lock()
            .expect("cart poisoned")
            .clone()
            .unwrap_or_default())
    }

    async fn replace(&self, items: Vec<RawCartItem>) -> Result<RawCart, StoreApiError> {
        self.inner.calls.record("replace");
        self.check_failing()?;
        let cart = RawCart {
            items,
            updated_at: Some(Utc::now()),
        };
        *self.inner.cart.lock().expect("cart poisoned") = Some(cart.clone());
        Ok(cart)
    }

    async fn clear(&self) -> Result<RawCart, StoreApiError> {
        self.inner.calls.record("clear");
        self.check_failing()?;
        *self.inner.cart.lock().expect("cart poisoned") = None;
        Ok(RawCart::default())
    }
}

// =============================================================================
// Catalog fake
// =============================================================================

#[derive(Default)]
struct CatalogInner {
    products: Mutex<HashMap<i64, Product>>,
    variations: Mutex<HashMap<i64, Vec<Variation>>>,
    failing: Mutex<HashSet<i64>>,
}

/// In-memory catalog.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    inner: Arc<CatalogInner>,
}

impl FakeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product with one gallery image.
    #[must_use]
    pub fn with_product(self, id: i64, name: &str, price: &str) -> Self {
        self.inner.products.lock().expect("products poisoned").insert(
            id,
            Product {
                id: ProductId::new(id),
                name: name.to_string(),
                price: price.to_string(),
                images: vec![ProductImage {
                    src: format!("https://img.goldenfig.test/{id}.jpg"),
                    alt: Some(name.to_string()),
                }],
                low_stock_remaining: None,
                backordered: false,
            },
        );
        self
    }

    /// Register a variation of a parent product.
    #[must_use]
    pub fn with_variation(self, product_id: i64, variation_id: i64, price: &str) -> Self {
        self.inner
            .variations
            .lock()
            .expect("variations poisoned")
            .entry(product_id)
            .or_default()
            .push(Variation {
                id: VariationId::new(variation_id),
                price: price.to_string(),
                image: Some(ProductImage {
                    src: format!("https://img.goldenfig.test/{variation_id}.jpg"),
                    alt: None,
                }),
                low_stock_remaining: None,
                backordered: false,
            });
        self
    }

    /// Make lookups for one product id fail.
    #[must_use]
    pub fn failing_for(self, product_id: i64) -> Self {
        self.inner
            .failing
            .lock()
            .expect("failing poisoned")
            .insert(product_id);
        self
    }
}

#[async_trait]
impl CatalogLookup for FakeCatalog {
    async fn product_by_id(&self, id: ProductId) -> Result<Product, StoreApiError> {
        if self
            .inner
            .failing
            .lock()
            .expect("failing poisoned")
            .contains(&id.as_i64())
        {
            return Err(StoreApiError::Status {
                status: 502,
                body: "catalog unavailable".to_string(),
            });
        }
        self.inner
            .products
            .lock()
            .expect("products poisoned")
            .get(&id.as_i64())
            .cloned()
            .ok_or_else(|| StoreApiError::NotFound(format!("product {id}")))
    }

    async fn variations_by_product_id(
        &self,
        id: ProductId,
    ) -> Result<Vec<Variation>, StoreApiError> {
        if self
            .inner
            .failing
            .lock()
            .expect("failing poisoned")
            .contains(&id.as_i64())
        {
            return Err(StoreApiError::Status {
                status: 502,
                body: "catalog unavailable".to_string(),
            });
        }
        Ok(self
            .inner
            .variations
            .lock()
            .expect("variations poisoned")
            .get(&id.as_i64())
            .cloned()
            .unwrap_or_default())
    }
}
