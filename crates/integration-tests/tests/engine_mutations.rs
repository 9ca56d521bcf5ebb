//! Mutation scenarios: dispatch to the active backend, quantity redirects,
//! optimistic state handling under failure.

use std::time::Duration;

use golden_fig_core::{CustomerId, LineKey, ProductId, VariationId};
use golden_fig_integration_tests::{FakeAccountCart, FakeCatalog, FakeSessionCart, engine, init_tracing};
use golden_fig_storefront::auth::Identity;
use golden_fig_storefront::cart::RawCartItem;
use golden_fig_storefront::error::StoreApiError;

#[tokio::test]
async fn anonymous_add_publishes_normalized_cart() {
    init_tracing();
    let session = FakeSessionCart::new().with_price(10, 1999);
    let account = FakeAccountCart::new();
    let catalog = FakeCatalog::new();
    let engine = engine(&session, &account, &catalog);

    engine
        .add_item(ProductId::new(10), 2, None)
        .await
        .expect("add to session cart");

    let snapshot = engine.snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.error, None);

    let cart = snapshot.cart.expect("cart published");
    assert_eq!(cart.item_count, 2);
    // 1999 minor units per item, two items: normalized to major units
    assert_eq!(cart.total, "39.98");
    assert_eq!(
        cart.lines.first().map(|line| line.unit_price.clone()),
        Some("19.99".to_string())
    );
    assert_eq!(session.calls().count("add_item"), 1);
    // The anonymous path never projects against the catalog
    assert_eq!(account.calls().count("fetch"), 0);
}

#[tokio::test]
async fn quantity_zero_and_negative_redirect_to_remove() {
    init_tracing();
    let session = FakeSessionCart::new().with_line(10, None, 2).with_line(20, None, 1);
    let account = FakeAccountCart::new();
    let catalog = FakeCatalog::new();
    let engine = engine(&session, &account, &catalog);
    engine.refresh().await.expect("initial session load");

    engine
        .update_quantity(LineKey::simple(ProductId::new(10)), 0)
        .await
        .expect("zero quantity");
    assert_eq!(session.calls().count("remove_item"), 1);
    assert_eq!(session.calls().count("update_item"), 0);

    engine
        .update_quantity(LineKey::simple(ProductId::new(20)), -3)
        .await
        .expect("negative quantity");
    assert_eq!(session.calls().count("remove_item"), 2);
    assert_eq!(session.calls().count("update_item"), 0);

    assert_eq!(engine.item_count(), 0);
}

#[tokio::test]
async fn add_with_quantity_zero_is_a_removal() {
    init_tracing();
    let session = FakeSessionCart::new().with_line(10, None, 2);
    let account = FakeAccountCart::new();
    let catalog = FakeCatalog::new();
    let engine = engine(&session, &account, &catalog);
    engine.refresh().await.expect("initial session load");

    engine
        .add_item(ProductId::new(10), 0, None)
        .await
        .expect("zero quantity add");

    assert_eq!(session.calls().count("add_item"), 0);
    assert_eq!(session.calls().count("remove_item"), 1);
}

#[tokio::test]
async fn authenticated_add_folds_into_full_replace() {
    init_tracing();
    let session = FakeSessionCart::new();
    let account = FakeAccountCart::new().with_line(10, None, 1);
    let catalog = FakeCatalog::new().with_product(10, "Fig Jam", "4.50");
    let engine = engine(&session, &account, &catalog);
    engine
        .set_identity(Identity::Authenticated(CustomerId::new(7)))
        .await
        .expect("sign in");

    engine
        .add_item(ProductId::new(10), 2, None)
        .await
        .expect("add to account cart");

    assert_eq!(account.calls().count("replace"), 1);
    assert_eq!(
        account.items(),
        vec![RawCartItem {
            product_id: ProductId::new(10),
            variation_id: None,
            quantity: 3,
        }]
    );

    let cart = engine.snapshot().cart.expect("re-projected cart");
    assert_eq!(cart.item_count, 3);
    assert_eq!(cart.total, "13.50");
}

#[tokio::test]
async fn authenticated_variation_lines_stay_distinct() {
    init_tracing();
    let session = FakeSessionCart::new();
    let account = FakeAccountCart::new();
    let catalog = FakeCatalog::new()
        .with_product(10, "Fig Tea", "8.00")
        .with_variation(10, 42, "9.25");
    let engine = engine(&session, &account, &catalog);
    engine
        .set_identity(Identity::Authenticated(CustomerId::new(7)))
        .await
        .expect("sign in");

    engine
        .add_item(ProductId::new(10), 1, None)
        .await
        .expect("add simple line");
    engine
        .add_item(ProductId::new(10), 1, Some(VariationId::new(42)))
        .await
        .expect("add variation line");

    assert_eq!(account.items().len(), 2);
    let cart = engine.snapshot().cart.expect("cart");
    // 8.00 for the simple line, 9.25 for the variation
    assert_eq!(cart.total, "17.25");
}

#[tokio::test]
async fn authenticated_update_to_zero_drops_the_line() {
    init_tracing();
    let session = FakeSessionCart::new();
    let account = FakeAccountCart::new().with_line(10, None, 4);
    let catalog = FakeCatalog::new().with_product(10, "Fig Jam", "4.50");
    let engine = engine(&session, &account, &catalog);
    engine
        .set_identity(Identity::Authenticated(CustomerId::new(7)))
        .await
        .expect("sign in");

    engine
        .update_quantity(LineKey::simple(ProductId::new(10)), 0)
        .await
        .expect("zero quantity");

    assert!(account.items().is_empty());
    assert_eq!(engine.item_count(), 0);
}

#[tokio::test]
async fn failed_mutation_keeps_last_good_cart_and_surfaces_error() {
    init_tracing();
    let session = FakeSessionCart::new().with_price(10, 1000);
    let account = FakeAccountCart::new();
    let catalog = FakeCatalog::new();
    let engine = engine(&session, &account, &catalog);

    engine
        .add_item(ProductId::new(10), 1, None)
        .await
        .expect("first add succeeds");
    assert_eq!(
        engine.snapshot().cart.as_ref().map(|c| c.total.clone()),
        Some("10.00".to_string())
    );

    session.set_failing(true);
    let err = engine
        .add_item(ProductId::new(10), 1, None)
        .await
        .expect_err("backend down");
    assert!(matches!(err, StoreApiError::Status { status: 503, .. }));

    let snapshot = engine.snapshot();
    assert!(!snapshot.is_loading);
    // No partial overwrite: the previously published cart is untouched
    assert_eq!(
        snapshot.cart.as_ref().map(|c| c.total.clone()),
        Some("10.00".to_string())
    );
    assert!(snapshot.error.expect("error surfaced").contains("503"));
}

#[tokio::test]
async fn clear_cart_empties_the_active_backend() {
    init_tracing();
    let session = FakeSessionCart::new().with_line(10, None, 2);
    let account = FakeAccountCart::new();
    let catalog = FakeCatalog::new();
    let engine = engine(&session, &account, &catalog);
    engine.refresh().await.expect("initial session load");

    engine.clear_cart().await.expect("clear session cart");
    assert_eq!(session.calls().count("clear"), 1);
    assert_eq!(engine.item_count(), 0);

    engine
        .set_identity(Identity::Authenticated(CustomerId::new(7)))
        .await
        .expect("sign in");
    engine
        .add_item(ProductId::new(20), 1, None)
        .await
        .expect("add to account cart");
    engine.clear_cart().await.expect("clear account cart");

    assert_eq!(account.calls().count("clear"), 1);
    assert!(account.items().is_empty());
    assert_eq!(engine.item_count(), 0);
}

#[tokio::test]
async fn loading_flag_tracks_the_round_trip() {
    init_tracing();
    let session = FakeSessionCart::new();
    session.set_latency(Duration::from_millis(80));
    let account = FakeAccountCart::new();
    let catalog = FakeCatalog::new();
    let engine = engine(&session, &account, &catalog);

    let in_flight = engine.clone();
    let handle =
        tokio::spawn(async move { in_flight.add_item(ProductId::new(10), 1, None).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(engine.snapshot().is_loading);

    handle.await.expect("join").expect("add succeeds");
    let snapshot = engine.snapshot();
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.item_count(), 1);
}
