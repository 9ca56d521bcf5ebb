//! Errors returned by the store API adapters.
//!
//! Every remote collaborator (session cart, account cart, catalog) speaks the
//! same REST dialect, so they share one error taxonomy. The engine converts
//! any of these into the human-readable `error` field of the published cart
//! snapshot; nothing here is fatal to the process.

use thiserror::Error;

/// Errors that can occur when talking to the store API.
#[derive(Debug, Error)]
pub enum StoreApiError {
    /// HTTP request failed before a response was produced.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("store API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the store API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// An account cart call was attempted without a bearer credential.
    #[error("sign-in required for account cart access")]
    AuthRequired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StoreApiError::NotFound("product 123".to_string());
        assert_eq!(err.to_string(), "Not found: product 123");

        let err = StoreApiError::RateLimited(60);
        assert_eq!(err.to_string(), "Rate limited, retry after 60 seconds");

        let err = StoreApiError::AuthRequired;
        assert_eq!(err.to_string(), "sign-in required for account cart access");
    }

    #[test]
    fn test_status_error_display() {
        let err = StoreApiError::Status {
            status: 502,
            body: "upstream unavailable".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "store API returned 502: upstream unavailable"
        );
    }
}
