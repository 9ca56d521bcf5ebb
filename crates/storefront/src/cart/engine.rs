//! The cart engine: single owner of cart state, dispatcher of every mutation.
//!
//! The engine holds at most one live cart - the session cart while anonymous,
//! the account cart while signed in - and republishes the UI-facing
//! [`CartSnapshot`] whenever held state settles. All mutation entry points
//! serialize through this type; no other component writes cart state.
//!
//! Identity transitions are observed as events. The anonymous-to-authenticated
//! edge is the only place the two carts are reconciled, and the session cart
//! is destroyed right after a successful merge so the merge cannot repeat.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tracing::{instrument, warn};

use golden_fig_core::{LineKey, ProductId, VariationId};

use crate::auth::Identity;
use crate::catalog::CatalogLookup;
use crate::error::StoreApiError;

use super::account::AccountCartBackend;
use super::merge::merge_carts;
use super::normalize::normalize_cart;
use super::projector::DisplayProjector;
use super::session::SessionCartBackend;
use super::types::{AnonymousCart, DisplayCart, RawCart, RawCartItem};

/// UI-facing read model, republished on every settled state change.
///
/// Single writer (the engine), any number of readers via
/// [`CartEngine::subscribe`].
#[derive(Debug, Clone, Default)]
pub struct CartSnapshot {
    /// The current display cart, `None` until the first load completes.
    pub cart: Option<DisplayCart>,
    /// Whether a backend round trip is in flight.
    pub is_loading: bool,
    /// Human-readable description of the last failure, cleared on the next
    /// successful settle.
    pub error: Option<String>,
}

impl CartSnapshot {
    /// Sum of line quantities of the current cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.as_ref().map_or(0, |cart| cart.item_count)
    }
}

/// The cart reconciliation engine.
///
/// One instance owns all cart state for a shopper session; hosts construct it
/// once and hand it to consumers by reference (it is cheaply cloneable).
pub struct CartEngine<S, A, C> {
    inner: Arc<EngineInner<S, A, C>>,
}

impl<S, A, C> Clone for CartEngine<S, A, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct EngineInner<S, A, C> {
    session: S,
    account: A,
    projector: DisplayProjector<C>,
    state: Mutex<EngineState>,
    snapshot: watch::Sender<CartSnapshot>,
}

#[derive(Default)]
struct EngineState {
    identity: Identity,
    /// Bumped on every identity transition; async results captured under an
    /// older epoch are discarded instead of applied.
    epoch: u64,
    anonymous: Option<AnonymousCart>,
    raw: Option<RawCart>,
}

/// Snapshot of state taken at the start of a mutation, before the lock is
/// released for the backend round trip.
struct MutationCtx {
    epoch: u64,
    identity: Identity,
    items: Vec<RawCartItem>,
}

impl<S, A, C> CartEngine<S, A, C>
where
    S: SessionCartBackend,
    A: AccountCartBackend,
    C: CatalogLookup,
{
    /// Create an engine in the anonymous state with no cart loaded.
    ///
    /// `currency` is the store currency stamped on projected carts; call
    /// [`Self::refresh`] to perform the initial load.
    pub fn new(session: S, account: A, catalog: C, currency: impl Into<String>) -> Self {
        let (snapshot, _) = watch::channel(CartSnapshot::default());
        Self {
            inner: Arc::new(EngineInner {
                session,
                account,
                projector: DisplayProjector::new(catalog, currency),
                state: Mutex::new(EngineState::default()),
                snapshot,
            }),
        }
    }

    // =========================================================================
    // Read model
    // =========================================================================

    /// Subscribe to snapshot changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartSnapshot> {
        self.inner.snapshot.subscribe()
    }

    /// The current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Sum of line quantities of the current cart.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.snapshot().item_count()
    }

    /// The identity the engine currently operates under.
    pub async fn identity(&self) -> Identity {
        self.inner.state.lock().await.identity
    }

    // =========================================================================
    // Identity transitions
    // =========================================================================

    /// Apply an identity observed from the session collaborator.
    ///
    /// Re-announcing the current identity (token refresh, re-render) is a
    /// no-op: transition work only runs on an actual edge.
    ///
    /// # Errors
    ///
    /// Returns the backend failure when loading or reconciling carts; the
    /// failure is also surfaced on the published snapshot.
    #[instrument(skip(self))]
    pub async fn set_identity(&self, identity: Identity) -> Result<(), StoreApiError> {
        let mut state = self.inner.state.lock().await;
        if state.identity == identity {
            return Ok(());
        }

        let previous = std::mem::replace(&mut state.identity, identity);
        // Anything still in flight belongs to the previous identity
        state.epoch += 1;

        match (previous, identity) {
            (Identity::Anonymous, Identity::Authenticated(_)) => {
                self.load_account(&mut state).await
            }
            (Identity::Authenticated(_), Identity::Anonymous) => {
                // The account cart is not live for an anonymous shopper
                state.raw = None;
                self.load_session(&mut state).await
            }
            (Identity::Authenticated(_), Identity::Authenticated(_)) => {
                // Account switch: a fresh load, never a merge
                state.raw = None;
                self.load_account(&mut state).await
            }
            (Identity::Anonymous, Identity::Anonymous) => Ok(()),
        }
    }

    /// Drive the engine from an identity change stream until it closes.
    pub async fn watch_identity(&self, mut identities: watch::Receiver<Identity>) {
        loop {
            let identity = *identities.borrow_and_update();
            if let Err(err) = self.set_identity(identity).await {
                warn!(error = %err, "identity transition failed");
            }
            if identities.changed().await.is_err() {
                break;
            }
        }
    }

    /// Load (or reload) the cart for the current identity.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; the failure is also surfaced on the
    /// published snapshot.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<(), StoreApiError> {
        let mut state = self.inner.state.lock().await;
        match state.identity {
            Identity::Anonymous => self.load_session(&mut state).await,
            Identity::Authenticated(_) => self.load_account(&mut state).await,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a line to the active cart.
    ///
    /// Quantity zero is routed to removal, never submitted as an add.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; held cart state is left untouched.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        product_id: ProductId,
        quantity: u32,
        variation_id: Option<VariationId>,
    ) -> Result<(), StoreApiError> {
        let key = LineKey::new(product_id, variation_id);
        if quantity == 0 {
            return self.remove_item(key).await;
        }

        let ctx = self.begin_mutation().await;
        match ctx.identity {
            Identity::Anonymous => {
                let result = self
                    .inner
                    .session
                    .add_item(product_id, quantity, variation_id)
                    .await;
                self.apply_session(ctx.epoch, result).await
            }
            Identity::Authenticated(_) => {
                let mut items = ctx.items;
                match items.iter_mut().find(|item| item.key() == key) {
                    Some(item) => item.quantity += quantity,
                    None => items.push(RawCartItem {
                        product_id: key.product_id(),
                        variation_id: key.variation_id(),
                        quantity,
                    }),
                }
                let result = self.inner.account.replace(items).await;
                self.apply_account(ctx.epoch, result).await
            }
        }
    }

    /// Set the quantity of a line.
    ///
    /// A quantity of zero or less is routed to removal for both identities.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; held cart state is left untouched.
    #[instrument(skip(self))]
    pub async fn update_quantity(&self, key: LineKey, quantity: i64) -> Result<(), StoreApiError> {
        if quantity <= 0 {
            return self.remove_item(key).await;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        let ctx = self.begin_mutation().await;
        match ctx.identity {
            Identity::Anonymous => {
                let result = self.inner.session.update_item(key, quantity).await;
                self.apply_session(ctx.epoch, result).await
            }
            Identity::Authenticated(_) => {
                let mut items = ctx.items;
                match items.iter_mut().find(|item| item.key() == key) {
                    Some(item) => item.quantity = quantity,
                    // Updating a line the server never saw is an upsert
                    None => items.push(RawCartItem {
                        product_id: key.product_id(),
                        variation_id: key.variation_id(),
                        quantity,
                    }),
                }
                let result = self.inner.account.replace(items).await;
                self.apply_account(ctx.epoch, result).await
            }
        }
    }

    /// Remove a line from the active cart.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; held cart state is left untouched.
    #[instrument(skip(self))]
    pub async fn remove_item(&self, key: LineKey) -> Result<(), StoreApiError> {
        let ctx = self.begin_mutation().await;
        match ctx.identity {
            Identity::Anonymous => {
                let result = self.inner.session.remove_item(key).await;
                self.apply_session(ctx.epoch, result).await
            }
            Identity::Authenticated(_) => {
                let mut items = ctx.items;
                items.retain(|item| item.key() != key);
                let result = self.inner.account.replace(items).await;
                self.apply_account(ctx.epoch, result).await
            }
        }
    }

    /// Remove every line from the active cart.
    ///
    /// # Errors
    ///
    /// Returns the backend failure; held cart state is left untouched.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> Result<(), StoreApiError> {
        let ctx = self.begin_mutation().await;
        match ctx.identity {
            Identity::Anonymous => {
                let result = self.inner.session.clear().await;
                self.apply_session(ctx.epoch, result).await
            }
            Identity::Authenticated(_) => {
                let result = self.inner.account.clear().await;
                self.apply_account(ctx.epoch, result).await
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Capture the state a mutation depends on, then release the lock for the
    /// backend round trip.
    async fn begin_mutation(&self) -> MutationCtx {
        let state = self.inner.state.lock().await;
        let ctx = MutationCtx {
            epoch: state.epoch,
            identity: state.identity,
            items: state
                .raw
                .as_ref()
                .map(|raw| raw.items.clone())
                .unwrap_or_default(),
        };
        drop(state);
        self.set_loading(true);
        ctx
    }

    /// Apply a session backend response, unless the identity moved on.
    async fn apply_session(
        &self,
        epoch: u64,
        result: Result<AnonymousCart, StoreApiError>,
    ) -> Result<(), StoreApiError> {
        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            // The response belongs to a session that is no longer current
            return Ok(());
        }

        match result {
            Ok(cart) => {
                let cart = normalize_cart(&cart);
                let display = DisplayCart::from(&cart);
                state.anonymous = Some(cart);
                self.publish_settled(display);
                Ok(())
            }
            Err(err) => {
                self.publish_error(&err);
                Err(err)
            }
        }
    }

    /// Apply an account backend response, unless the identity moved on.
    async fn apply_account(
        &self,
        epoch: u64,
        result: Result<RawCart, StoreApiError>,
    ) -> Result<(), StoreApiError> {
        let mut state = self.inner.state.lock().await;
        if state.epoch != epoch {
            return Ok(());
        }

        match result {
            Ok(raw) => {
                // Held state and the projection derived from it settle
                // together, never interleaved with a transition
                let display = self.inner.projector.project(&raw).await;
                state.raw = Some(raw);
                self.publish_settled(display);
                Ok(())
            }
            Err(err) => {
                self.publish_error(&err);
                Err(err)
            }
        }
    }

    /// Load the session cart and make it the live one.
    async fn load_session(&self, state: &mut EngineState) -> Result<(), StoreApiError> {
        self.set_loading(true);
        match self.inner.session.fetch().await {
            Ok(cart) => {
                let cart = cart.as_ref().map(normalize_cart);
                let display = cart.as_ref().map_or_else(
                    || DisplayCart::empty(self.inner.projector.currency()),
                    DisplayCart::from,
                );
                state.anonymous = cart;
                self.publish_settled(display);
                Ok(())
            }
            Err(err) => {
                self.publish_error(&err);
                Err(err)
            }
        }
    }

    /// Load the account cart, reconciling any held session cart first.
    async fn load_account(&self, state: &mut EngineState) -> Result<(), StoreApiError> {
        self.set_loading(true);

        // Capture the pre-login session cart before touching account state;
        // it is restored on failure so a retry can still reconcile it
        let pre_login = state.anonymous.take();

        match self.establish_account_cart(pre_login.as_ref()).await {
            Ok(raw) => {
                let display = self.inner.projector.project(&raw).await;
                state.raw = Some(raw);
                self.publish_settled(display);
                Ok(())
            }
            Err(err) => {
                state.anonymous = pre_login;
                self.publish_error(&err);
                Err(err)
            }
        }
    }

    /// Fetch the account cart, merging in the pre-login session cart when it
    /// has lines. A successful merge destroys the session cart so it cannot
    /// be merged twice.
    async fn establish_account_cart(
        &self,
        pre_login: Option<&AnonymousCart>,
    ) -> Result<RawCart, StoreApiError> {
        let server = self.inner.account.fetch().await?;

        let Some(session_cart) = pre_login.filter(|cart| !cart.is_empty()) else {
            return Ok(server);
        };

        let merged = merge_carts(session_cart, &server, Utc::now());
        let raw = self.inner.account.replace(merged.items).await?;

        if let Err(err) = self.inner.session.destroy().await {
            // The account cart is already authoritative; an orphaned session
            // cart expires with the session
            warn!(error = %err, "failed to destroy session cart after merge");
        }

        Ok(raw)
    }

    // =========================================================================
    // Snapshot publishing
    // =========================================================================

    fn set_loading(&self, is_loading: bool) {
        self.inner
            .snapshot
            .send_modify(|snapshot| snapshot.is_loading = is_loading);
    }

    fn publish_settled(&self, cart: DisplayCart) {
        self.inner.snapshot.send_replace(CartSnapshot {
            cart: Some(cart),
            is_loading: false,
            error: None,
        });
    }

    fn publish_error(&self, err: &StoreApiError) {
        // Failures never clobber the last good cart
        self.inner.snapshot.send_modify(|snapshot| {
            snapshot.is_loading = false;
            snapshot.error = Some(err.to_string());
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_item_count_without_cart() {
        assert_eq!(CartSnapshot::default().item_count(), 0);
    }

    #[test]
    fn test_snapshot_item_count_with_cart() {
        let snapshot = CartSnapshot {
            cart: Some(DisplayCart {
                lines: Vec::new(),
                item_count: 7,
                currency: "USD".to_string(),
                subtotal: "0.00".to_string(),
                total: "0.00".to_string(),
            }),
            is_loading: false,
            error: None,
        };
        assert_eq!(snapshot.item_count(), 7);
    }
}
