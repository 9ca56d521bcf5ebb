//! Identity as observed from the session collaborator.
//!
//! Login, token issuance, and refresh all live outside this crate. The engine
//! consumes three things: the current [`Identity`], a stream of identity
//! changes (any `watch::Receiver<Identity>` will do, see
//! [`crate::cart::CartEngine::watch_identity`]), and a bearer credential for
//! account cart calls, obtained per call through [`CredentialSource`].

use secrecy::SecretString;

use golden_fig_core::CustomerId;

/// Who the shopper currently is.
///
/// Transitions are observed as events; the engine keeps the previous value
/// across a transition so it can detect the anonymous-to-authenticated edge
/// (the only edge that triggers a cart merge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Identity {
    /// No stable identity beyond the implicit browser session.
    #[default]
    Anonymous,
    /// Signed in as the given customer.
    Authenticated(CustomerId),
}

impl Identity {
    /// Whether this identity can address the durable account cart.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Source of the bearer credential for account cart calls.
///
/// Implementations typically front a token store owned by the identity layer;
/// returning `None` means the account cart cannot be addressed right now and
/// the call fails with [`crate::error::StoreApiError::AuthRequired`] before
/// any request is issued.
pub trait CredentialSource: Send + Sync {
    /// The current bearer credential, if one is held.
    fn bearer(&self) -> Option<SecretString>;
}
