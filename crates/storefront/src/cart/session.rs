//! Session cart backend adapter.
//!
//! The anonymous backend owns a session-scoped cart resource, created lazily
//! on the first mutation and addressed by a cart token it issues. Every call
//! returns the full cart object with minor-unit monetary fields; the engine
//! normalizes those before anything reaches the UI.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;

use golden_fig_core::{LineKey, ProductId, VariationId};

use crate::config::StoreApiConfig;
use crate::error::StoreApiError;
use crate::http::{self, StoreTransport};

use super::types::AnonymousCart;

const CART_TOKEN_HEADER: &str = "Cart-Token";

/// CRUD over the session-scoped cart resource.
#[async_trait]
pub trait SessionCartBackend: Send + Sync {
    /// Fetch the current session cart, `None` when none exists yet.
    async fn fetch(&self) -> Result<Option<AnonymousCart>, StoreApiError>;

    /// Add a line; the backend folds repeats into the existing line.
    async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        variation_id: Option<VariationId>,
    ) -> Result<AnonymousCart, StoreApiError>;

    /// Set the quantity of an existing line.
    async fn update_item(&self, key: LineKey, quantity: u32)
    -> Result<AnonymousCart, StoreApiError>;

    /// Remove a line.
    async fn remove_item(&self, key: LineKey) -> Result<AnonymousCart, StoreApiError>;

    /// Remove every line, keeping the cart resource alive.
    async fn clear(&self) -> Result<AnonymousCart, StoreApiError>;

    /// Delete the cart resource and forget the local token.
    ///
    /// Called after a successful sign-in merge; once destroyed, the merge
    /// cannot repeat.
    async fn destroy(&self) -> Result<(), StoreApiError>;
}

#[derive(Serialize)]
struct AddItemRequest {
    product_id: ProductId,
    #[serde(skip_serializing_if = "Option::is_none")]
    variation_id: Option<VariationId>,
    quantity: u32,
}

#[derive(Serialize)]
struct UpdateQuantityRequest {
    quantity: u32,
}

/// HTTP session cart client holding the backend-issued cart token.
pub struct HttpSessionCart {
    transport: StoreTransport,
    token: Mutex<Option<String>>,
}

impl HttpSessionCart {
    /// Create a new session cart client with no cart token held.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &StoreApiConfig) -> Result<Self, StoreApiError> {
        Ok(Self {
            transport: StoreTransport::new(config)?,
            token: Mutex::new(None),
        })
    }

    /// Path for one line, addressed by its identity.
    fn item_path(key: LineKey) -> String {
        format!("cart/items/{}", key.product_id())
    }

    fn variation_query(key: LineKey) -> Vec<(&'static str, i64)> {
        key.variation_id()
            .map(|v| vec![("variation_id", v.as_i64())])
            .unwrap_or_default()
    }

    /// Send a request, then adopt the cart token echoed by the backend.
    async fn dispatch(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<AnonymousCart, StoreApiError> {
        let request = match self.token.lock().await.clone() {
            Some(token) => request.header(CART_TOKEN_HEADER, token),
            None => request,
        };

        let response = request.send().await?;
        let header_token = response
            .headers()
            .get(CART_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let cart: AnonymousCart = http::read_json(response, "session cart").await?;

        // The token also rides in the body; the header wins when both differ
        let token = header_token.unwrap_or_else(|| cart.cart_token.clone());
        *self.token.lock().await = Some(token);

        Ok(cart)
    }
}

#[async_trait]
impl SessionCartBackend for HttpSessionCart {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Option<AnonymousCart>, StoreApiError> {
        if self.token.lock().await.is_none() {
            // No handle yet; the backend creates the cart on first mutation
            return Ok(None);
        }

        match self
            .dispatch(self.transport.request(Method::GET, "cart"))
            .await
        {
            Ok(cart) => Ok(Some(cart)),
            Err(StoreApiError::NotFound(_)) => {
                // The session expired server-side; drop the stale token
                *self.token.lock().await = None;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self))]
    async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        variation_id: Option<VariationId>,
    ) -> Result<AnonymousCart, StoreApiError> {
        let request = self
            .transport
            .request(Method::POST, "cart/items")
            .json(&AddItemRequest {
                product_id,
                variation_id,
                quantity,
            });
        self.dispatch(request).await
    }

    #[instrument(skip(self))]
    async fn update_item(
        &self,
        key: LineKey,
        quantity: u32,
    ) -> Result<AnonymousCart, StoreApiError> {
        let request = self
            .transport
            .request(Method::PUT, &Self::item_path(key))
            .query(&Self::variation_query(key))
            .json(&UpdateQuantityRequest { quantity });
        self.dispatch(request).await
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, key: LineKey) -> Result<AnonymousCart, StoreApiError> {
        let request = self
            .transport
            .request(Method::DELETE, &Self::item_path(key))
            .query(&Self::variation_query(key));
        self.dispatch(request).await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<AnonymousCart, StoreApiError> {
        self.dispatch(self.transport.request(Method::DELETE, "cart/items"))
            .await
    }

    #[instrument(skip(self))]
    async fn destroy(&self) -> Result<(), StoreApiError> {
        let Some(token) = self.token.lock().await.take() else {
            return Ok(());
        };

        let response = self
            .transport
            .request(Method::DELETE, "cart")
            .header(CART_TOKEN_HEADER, token)
            .send()
            .await?;

        match http::expect_empty(response, "session cart").await {
            // Already gone server-side is as good as destroyed
            Ok(()) | Err(StoreApiError::NotFound(_)) => Ok(()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_path_uses_product_id() {
        let key = LineKey::with_variation(ProductId::new(10), VariationId::new(42));
        assert_eq!(HttpSessionCart::item_path(key), "cart/items/10");
    }

    #[test]
    fn test_variation_query_only_for_variations() {
        let simple = LineKey::simple(ProductId::new(10));
        assert!(HttpSessionCart::variation_query(simple).is_empty());

        let varied = LineKey::with_variation(ProductId::new(10), VariationId::new(42));
        assert_eq!(
            HttpSessionCart::variation_query(varied),
            vec![("variation_id", 42)]
        );
    }
}
