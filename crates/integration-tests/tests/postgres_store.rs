//! Order workflow against a real `PostgreSQL` database.
//!
//! These tests require `GALLERY_TEST_DATABASE_URL` pointing at a scratch
//! database. Run with: cargo test -p canvas-gallery-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use canvas_gallery_core::OrderStatus;
use canvas_gallery_integration_tests::{
    admin_contact, checkout_request, insert_painting, insert_user, test_pool, unique_title,
};
use canvas_gallery_storefront::db::{PgStore, Store};
use canvas_gallery_storefront::models::DeliveryAddress;
use canvas_gallery_storefront::services::admin::AdminService;
use canvas_gallery_storefront::services::cart::CartService;
use canvas_gallery_storefront::services::notify::LogNotifier;
use canvas_gallery_storefront::services::orders::{OrderError, OrderService};
use canvas_gallery_storefront::services::users::{SavedAddressRequest, UserError, UserService};

async fn stock_of(store: &PgStore, painting: canvas_gallery_core::PaintingId) -> (i32, bool) {
    let mut uow = store.begin().await.unwrap();
    let painting = uow.find_painting(painting).await.unwrap().unwrap();
    (painting.stock_quantity, painting.is_available)
}

#[tokio::test]
#[ignore = "Requires GALLERY_TEST_DATABASE_URL"]
async fn test_checkout_and_cancel_round_trip() {
    let store = PgStore::new(test_pool().await);
    let contact = admin_contact();
    let orders = OrderService::new(&store, &LogNotifier, &contact);
    let cart = CartService::new(&store);

    let buyer = insert_user(&store, "Meera Nair").await;
    let ghats = insert_painting(&store, &unique_title("Monsoon Ghats"), "1500.00", 3).await;
    let lotus = insert_painting(&store, &unique_title("Lotus Pond"), "2750.50", 1).await;

    cart.add(buyer, ghats.id, 2).await.unwrap();
    cart.add(buyer, lotus.id, 1).await.unwrap();

    let order = orders.checkout(buyer, &checkout_request()).await.unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount.to_string(), "5750.50");
    assert_eq!(order.items.len(), 2);
    assert_eq!(stock_of(&store, ghats.id).await, (1, true));
    assert_eq!(stock_of(&store, lotus.id).await, (0, false));
    assert!(cart.get(buyer).await.unwrap().items.is_empty());

    let fetched = orders.get(buyer, order.id).await.unwrap();
    assert_eq!(fetched.order_number, order.order_number);
    assert_eq!(fetched.items[0].price_at_purchase, ghats.price);

    let cancelled = orders.cancel(buyer, order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(stock_of(&store, ghats.id).await, (3, true));
    assert_eq!(stock_of(&store, lotus.id).await, (1, true));

    let err = orders.cancel(buyer, order.id).await.unwrap_err();
    assert!(matches!(err, OrderError::InvalidState));
}

#[tokio::test]
#[ignore = "Requires GALLERY_TEST_DATABASE_URL"]
async fn test_rejected_checkout_changes_nothing() {
    let store = PgStore::new(test_pool().await);
    let contact = admin_contact();
    let orders = OrderService::new(&store, &LogNotifier, &contact);
    let cart = CartService::new(&store);

    let buyer = insert_user(&store, "Meera Nair").await;
    let ghats = insert_painting(&store, &unique_title("Monsoon Ghats"), "1500.00", 2).await;
    let lotus = insert_painting(&store, &unique_title("Lotus Pond"), "2750.50", 2).await;
    cart.add(buyer, ghats.id, 2).await.unwrap();
    cart.add(buyer, lotus.id, 2).await.unwrap();

    // Someone else takes one Lotus Pond first
    let other = insert_user(&store, "Kabir").await;
    cart.add(other, lotus.id, 1).await.unwrap();
    orders.checkout(other, &checkout_request()).await.unwrap();

    let err = orders.checkout(buyer, &checkout_request()).await.unwrap_err();
    assert!(matches!(
        err,
        OrderError::InsufficientStock { available: 1, .. }
    ));
    assert_eq!(stock_of(&store, ghats.id).await, (2, true));
    assert_eq!(cart.get(buyer).await.unwrap().items.len(), 2);

    let page = orders
        .list(buyer, canvas_gallery_storefront::models::PageRequest::default())
        .await
        .unwrap();
    assert_eq!(page.total_items, 0);
}

#[tokio::test]
#[ignore = "Requires GALLERY_TEST_DATABASE_URL"]
async fn test_concurrent_checkouts_sell_the_last_unit_once() {
    let store = PgStore::new(test_pool().await);
    let contact = admin_contact();
    let orders = OrderService::new(&store, &LogNotifier, &contact);
    let cart = CartService::new(&store);

    let lotus = insert_painting(&store, &unique_title("Lotus Pond"), "2750.50", 1).await;
    let meera = insert_user(&store, "Meera Nair").await;
    let kabir = insert_user(&store, "Kabir").await;
    cart.add(meera, lotus.id, 1).await.unwrap();
    cart.add(kabir, lotus.id, 1).await.unwrap();

    let request = checkout_request();
    let (first, second) = tokio::join!(
        orders.checkout(meera, &request),
        orders.checkout(kabir, &request),
    );

    let sold = usize::from(first.is_ok()) + usize::from(second.is_ok());
    assert_eq!(sold, 1);
    let loser = first.err().or(second.err()).unwrap();
    assert!(
        matches!(
            loser,
            OrderError::PaintingUnavailable { .. } | OrderError::InsufficientStock { .. }
        ),
        "unexpected error: {loser}"
    );
    assert_eq!(stock_of(&store, lotus.id).await, (0, false));
}

#[tokio::test]
#[ignore = "Requires GALLERY_TEST_DATABASE_URL"]
async fn test_admin_status_changes() {
    let store = PgStore::new(test_pool().await);
    let contact = admin_contact();
    let orders = OrderService::new(&store, &LogNotifier, &contact);
    let cart = CartService::new(&store);

    let buyer = insert_user(&store, "Meera Nair").await;
    let ghats = insert_painting(&store, &unique_title("Monsoon Ghats"), "1500.00", 1).await;
    cart.add(buyer, ghats.id, 1).await.unwrap();
    let order = orders.checkout(buyer, &checkout_request()).await.unwrap();

    let shipped = orders
        .update_status(order.id, OrderStatus::Shipped, Some("BLUEDART 8812"))
        .await
        .unwrap();
    assert_eq!(shipped.tracking_info.as_deref(), Some("BLUEDART 8812"));

    let err = orders
        .update_status(order.id, OrderStatus::Confirmed, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));

    orders
        .update_status(order.id, OrderStatus::Cancelled, None)
        .await
        .unwrap();
    assert_eq!(stock_of(&store, ghats.id).await, (1, true));
}

#[tokio::test]
#[ignore = "Requires GALLERY_TEST_DATABASE_URL"]
async fn test_address_book_is_separate_from_order_snapshots() {
    let store = PgStore::new(test_pool().await);
    let contact = admin_contact();
    let orders = OrderService::new(&store, &LogNotifier, &contact);
    let users = UserService::new(&store);

    let buyer = insert_user(&store, "Meera Nair").await;
    let ghats = insert_painting(&store, &unique_title("Monsoon Ghats"), "1500.00", 1).await;
    let saved = |street: &str, is_default: bool| SavedAddressRequest {
        address: DeliveryAddress {
            street: street.to_owned(),
            ..checkout_request().delivery_address
        },
        is_default,
    };

    let home = users.add_address(buyer, &saved("12 MG Road", true)).await.unwrap();
    let studio = users
        .add_address(buyer, &saved("4 Church Street", false))
        .await
        .unwrap();
    users.set_default_address(buyer, studio.id).await.unwrap();

    CartService::new(&store).add(buyer, ghats.id, 1).await.unwrap();
    let order = orders.checkout(buyer, &checkout_request()).await.unwrap();
    let street = order.delivery_address.street.clone();

    users
        .update_address(buyer, home.id, &saved("99 Residency Road", false))
        .await
        .unwrap();
    users.delete_address(buyer, studio.id).await.unwrap();

    let book = users.addresses(buyer).await.unwrap();
    assert_eq!(book.len(), 1);
    assert_eq!(book[0].street, "99 Residency Road");
    assert!(!book[0].is_default);

    let fetched = orders.get(buyer, order.id).await.unwrap();
    assert_eq!(fetched.delivery_address.street, street);
    let err = users
        .delete_address(buyer, order.delivery_address.id)
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::AddressNotFound));
}

#[tokio::test]
#[ignore = "Requires GALLERY_TEST_DATABASE_URL"]
async fn test_dashboard_queries_run() {
    let store = PgStore::new(test_pool().await);
    let contact = admin_contact();
    let orders = OrderService::new(&store, &LogNotifier, &contact);

    let buyer = insert_user(&store, "Meera Nair").await;
    let ghats = insert_painting(&store, &unique_title("Monsoon Ghats"), "1500.00", 2).await;
    CartService::new(&store).add(buyer, ghats.id, 1).await.unwrap();
    orders.checkout(buyer, &checkout_request()).await.unwrap();

    let stats = AdminService::new(&store).dashboard_stats().await.unwrap();
    assert!(stats.new_users_this_month >= 1);
    assert!(stats.revenue_this_month >= ghats.price);
    assert!(stats.revenue_this_year >= stats.revenue_this_month);
    assert_eq!(
        stats.paintings.out_of_stock_paintings,
        stats.paintings.total_paintings - stats.paintings.available_paintings
    );
    assert!(stats.most_viewed_paintings.len() <= 5);
    assert!(!stats.best_selling_paintings.is_empty());

    let latest = &stats.monthly_revenue_trend[0];
    assert!((1..=12).contains(&latest.month));
    assert!(latest.order_count >= 1);
    assert!(stats.monthly_revenue_trend.len() <= 12);
}
