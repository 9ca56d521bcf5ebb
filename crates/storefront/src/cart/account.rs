//! Account cart backend adapter.
//!
//! The authenticated backend owns a durable per-account cart addressed by a
//! bearer credential. The wire carries only line identities and quantities -
//! no monetary fields at all. Mutations are full-replace writes; the response
//! is always the server's authoritative cart.

use async_trait::async_trait;
use reqwest::Method;
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::instrument;

use crate::auth::CredentialSource;
use crate::config::StoreApiConfig;
use crate::error::StoreApiError;
use crate::http::{self, StoreTransport};

use super::types::{RawCart, RawCartItem};

/// CRUD over the durable per-account cart.
#[async_trait]
pub trait AccountCartBackend: Send + Sync {
    /// Fetch the account cart; an account with no cart yet yields an empty
    /// one.
    async fn fetch(&self) -> Result<RawCart, StoreApiError>;

    /// Replace the full line list; the response is the authoritative cart.
    async fn replace(&self, items: Vec<RawCartItem>) -> Result<RawCart, StoreApiError>;

    /// Delete the account cart.
    async fn clear(&self) -> Result<RawCart, StoreApiError>;
}

#[derive(Serialize)]
struct ReplaceCartRequest {
    items: Vec<RawCartItem>,
}

/// HTTP account cart client.
pub struct HttpAccountCart<T> {
    transport: StoreTransport,
    credentials: T,
}

impl<T: CredentialSource> HttpAccountCart<T> {
    /// Create a new account cart client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &StoreApiConfig, credentials: T) -> Result<Self, StoreApiError> {
        Ok(Self {
            transport: StoreTransport::new(config)?,
            credentials,
        })
    }

    /// Build a bearer-authorized request, failing before any I/O when no
    /// credential is held.
    fn authorized(
        &self,
        method: Method,
        path: &str,
    ) -> Result<reqwest::RequestBuilder, StoreApiError> {
        let bearer = self
            .credentials
            .bearer()
            .ok_or(StoreApiError::AuthRequired)?;
        Ok(self
            .transport
            .request(method, path)
            .bearer_auth(bearer.expose_secret()))
    }
}

#[async_trait]
impl<T: CredentialSource> AccountCartBackend for HttpAccountCart<T> {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<RawCart, StoreApiError> {
        let response = self.authorized(Method::GET, "account/cart")?.send().await?;
        match http::read_json(response, "account cart").await {
            Ok(cart) => Ok(cart),
            // A shopper who never saved a cart starts from empty
            Err(StoreApiError::NotFound(_)) => Ok(RawCart::default()),
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, items), fields(lines = items.len()))]
    async fn replace(&self, items: Vec<RawCartItem>) -> Result<RawCart, StoreApiError> {
        let response = self
            .authorized(Method::POST, "account/cart")?
            .json(&ReplaceCartRequest { items })
            .send()
            .await?;
        http::read_json(response, "account cart").await
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<RawCart, StoreApiError> {
        let response = self
            .authorized(Method::DELETE, "account/cart")?
            .send()
            .await?;
        match http::expect_empty(response, "account cart").await {
            Ok(()) | Err(StoreApiError::NotFound(_)) => Ok(RawCart::default()),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;

    struct NoCredentials;

    impl CredentialSource for NoCredentials {
        fn bearer(&self) -> Option<SecretString> {
            None
        }
    }

    fn config() -> StoreApiConfig {
        StoreApiConfig {
            base_url: "https://shop.example.com/api".to_string(),
            api_version: "v1".to_string(),
            api_key: SecretString::from("k3y"),
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_any_request() {
        let backend = HttpAccountCart::new(&config(), NoCredentials).expect("client");

        let err = backend.fetch().await.expect_err("no credential held");
        assert!(matches!(err, StoreApiError::AuthRequired));

        let err = backend.replace(Vec::new()).await.expect_err("no credential held");
        assert!(matches!(err, StoreApiError::AuthRequired));
    }
}
