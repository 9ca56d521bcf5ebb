//! Shared REST plumbing for the store API adapters.
//!
//! All three remote collaborators (session cart, account cart, catalog) are
//! resources under one base URL and share the same response discipline:
//! rate-limit detection, text-first body reads for error diagnostics, and
//! explicit status mapping before JSON parsing.

use reqwest::{Method, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::config::StoreApiConfig;
use crate::error::StoreApiError;

const API_KEY_HEADER: &str = "X-Store-Api-Key";
const BODY_LOG_LIMIT: usize = 500;

/// Shared HTTP client plus the request scaffolding every adapter needs.
#[derive(Clone)]
pub(crate) struct StoreTransport {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    api_key: SecretString,
}

impl StoreTransport {
    /// Build a transport from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &StoreApiConfig) -> Result<Self, StoreApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Build a request for a path under the versioned API root.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}/{}", self.base_url, self.api_version, path);
        self.client
            .request(method, url)
            .header(API_KEY_HEADER, self.api_key.expose_secret())
    }
}

/// Read a JSON body after mapping the response status.
///
/// `context` names the resource for `NotFound` and log lines.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: Response,
    context: &str,
) -> Result<T, StoreApiError> {
    let text = check_status(response, context).await?;

    match serde_json::from_str(&text) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::error!(
                error = %e,
                context = %context,
                body = %truncate_body(&text),
                "Failed to parse store API response"
            );
            Err(StoreApiError::Parse(e))
        }
    }
}

/// Consume a response that carries no meaningful body (e.g., 204 on DELETE).
pub(crate) async fn expect_empty(response: Response, context: &str) -> Result<(), StoreApiError> {
    check_status(response, context).await.map(|_| ())
}

/// Map rate limiting and error statuses, returning the body text on success.
async fn check_status(response: Response, context: &str) -> Result<String, StoreApiError> {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(1);
        return Err(StoreApiError::RateLimited(retry_after));
    }

    if status == StatusCode::NOT_FOUND {
        return Err(StoreApiError::NotFound(context.to_string()));
    }

    // Read the body as text first for better error diagnostics
    let text = response.text().await?;

    if !status.is_success() {
        tracing::error!(
            status = %status,
            context = %context,
            body = %truncate_body(&text),
            "Store API returned non-success status"
        );
        return Err(StoreApiError::Status {
            status: status.as_u16(),
            body: truncate_body(&text),
        });
    }

    Ok(text)
}

fn truncate_body(body: &str) -> String {
    body.chars().take(BODY_LOG_LIMIT).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_limits_length() {
        let long = "x".repeat(2000);
        assert_eq!(truncate_body(&long).len(), BODY_LOG_LIMIT);
        assert_eq!(truncate_body("short"), "short");
    }
}
