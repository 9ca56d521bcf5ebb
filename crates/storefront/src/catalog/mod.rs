//! Catalog lookup adapter.
//!
//! A pure read collaborator: given a product id, return the canonical product
//! record or its variation list. The HTTP implementation caches responses
//! using `moka` (5-minute TTL); the display projector joins cart lines
//! against this adapter on every re-projection, so repeat reads are cheap.

pub mod types;

pub use types::{Product, ProductImage, Variation};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use reqwest::Method;
use tracing::{debug, instrument};

use golden_fig_core::ProductId;

use crate::config::StoreApiConfig;
use crate::error::StoreApiError;
use crate::http::{self, StoreTransport};

/// Read access to products and their variations.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Fetch the canonical product record.
    async fn product_by_id(&self, id: ProductId) -> Result<Product, StoreApiError>;

    /// Fetch the variation list of a parent product.
    async fn variations_by_product_id(
        &self,
        id: ProductId,
    ) -> Result<Vec<Variation>, StoreApiError>;
}

#[derive(Clone)]
enum CacheValue {
    Product(Box<Product>),
    Variations(Vec<Variation>),
}

/// HTTP catalog client with response caching.
#[derive(Clone)]
pub struct HttpCatalog {
    inner: Arc<HttpCatalogInner>,
}

struct HttpCatalogInner {
    transport: StoreTransport,
    cache: Cache<String, CacheValue>,
}

impl HttpCatalog {
    /// Create a new catalog client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &StoreApiConfig) -> Result<Self, StoreApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(HttpCatalogInner {
                transport: StoreTransport::new(config)?,
                cache,
            }),
        })
    }

    /// Invalidate the cached product and variation list for one product.
    pub async fn invalidate_product(&self, id: ProductId) {
        self.inner.cache.invalidate(&format!("product:{id}")).await;
        self.inner
            .cache
            .invalidate(&format!("variations:{id}"))
            .await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl CatalogLookup for HttpCatalog {
    #[instrument(skip(self))]
    async fn product_by_id(&self, id: ProductId) -> Result<Product, StoreApiError> {
        let cache_key = format!("product:{id}");

        // Check cache
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let response = self
            .inner
            .transport
            .request(Method::GET, &format!("products/{id}"))
            .send()
            .await?;
        let product: Product = http::read_json(response, &format!("product {id}")).await?;

        // Cache the result
        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    #[instrument(skip(self))]
    async fn variations_by_product_id(
        &self,
        id: ProductId,
    ) -> Result<Vec<Variation>, StoreApiError> {
        let cache_key = format!("variations:{id}");

        // Check cache
        if let Some(CacheValue::Variations(variations)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for variations");
            return Ok(variations);
        }

        let response = self
            .inner
            .transport
            .request(Method::GET, &format!("products/{id}/variations"))
            .send()
            .await?;
        let variations: Vec<Variation> =
            http::read_json(response, &format!("variations of product {id}")).await?;

        // Cache the result
        self.inner
            .cache
            .insert(cache_key, CacheValue::Variations(variations.clone()))
            .await;

        Ok(variations)
    }
}
