//! Checkout, cancellation and order lookup against the in-memory store.

#![allow(clippy::unwrap_used)]

mod common;

use canvas_gallery_core::{CurrencyCode, OrderId, OrderStatus, PaymentMethod};
use canvas_gallery_storefront::db::RepositoryError;
use canvas_gallery_storefront::models::PageRequest;
use canvas_gallery_storefront::services::orders::OrderError;

use common::{Gallery, RecordingNotifier, checkout_request, money};

#[tokio::test]
async fn test_checkout_places_pending_cod_order() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    let lotus = gallery.painting("Lotus Pond", "2750.50", 1).await;

    gallery.cart().add(buyer.id, ghats.id, 2).await.unwrap();
    gallery.cart().add(buyer.id, lotus.id, 1).await.unwrap();

    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
    assert_eq!(order.currency, CurrencyCode::INR);
    assert_eq!(order.total_amount, money("5750.50"));
    assert_eq!(order.notes.as_deref(), Some("Please call before delivery"));
    assert_eq!(order.delivery_address.city, "Bengaluru");
    assert_eq!(order.delivery_address.user_id, buyer.id);
    assert!(!order.delivery_address.is_default);
    assert_eq!(order.admin_contact, gallery.contact);
    assert!(order.order_number.as_str().starts_with("TC"));

    assert_eq!(order.items.len(), 2);
    let first = &order.items[0];
    assert_eq!(first.painting_id, ghats.id);
    assert_eq!(first.painting_title, "Monsoon Ghats");
    assert_eq!(first.artist_name, "Anjali Rao");
    assert_eq!(first.quantity, 2);
    assert_eq!(first.price_at_purchase, money("1500.00"));
    assert_eq!(first.subtotal, money("3000.00"));
}

#[tokio::test]
async fn test_checkout_updates_stock_and_clears_cart() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    let lotus = gallery.painting("Lotus Pond", "2750.50", 1).await;

    gallery.cart().add(buyer.id, ghats.id, 2).await.unwrap();
    gallery.cart().add(buyer.id, lotus.id, 1).await.unwrap();
    gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();

    let ghats = gallery.reload(ghats.id).await;
    assert_eq!(ghats.stock_quantity, 1);
    assert!(ghats.is_available);
    assert_eq!(ghats.purchase_count, 2);

    let lotus = gallery.reload(lotus.id).await;
    assert_eq!(lotus.stock_quantity, 0);
    assert!(!lotus.is_available);
    assert_eq!(lotus.purchase_count, 1);

    assert_eq!(gallery.cart_size(buyer.id).await, 0);
}

#[tokio::test]
async fn test_checkout_total_is_exact() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Kabir", "kabir@example.in").await;
    let sketch = gallery.painting("Charcoal Study", "0.10", 5).await;
    let print = gallery.painting("Small Print", "0.20", 5).await;

    gallery.cart().add(buyer.id, sketch.id, 3).await.unwrap();
    gallery.cart().add(buyer.id, print.id, 1).await.unwrap();

    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();
    assert_eq!(order.total_amount, money("0.50"));
    assert_eq!(order.total_amount.to_string(), "0.50");
}

#[tokio::test]
async fn test_checkout_sends_confirmation() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    gallery.cart().add(buyer.id, ghats.id, 1).await.unwrap();

    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();

    let sent = gallery.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, "meera@example.in");
    assert_eq!(sent[0].name, "Meera Nair");
    assert_eq!(sent[0].order_number, order.order_number);
    assert_eq!(sent[0].amount, "1500.00 INR");
}

#[tokio::test]
async fn test_notification_failure_does_not_undo_order() {
    let gallery = Gallery::with_notifier(RecordingNotifier::failing());
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    gallery.cart().add(buyer.id, ghats.id, 1).await.unwrap();

    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();

    assert_eq!(gallery.notifier.sent().len(), 1);
    let stored = gallery.orders().get(buyer.id, order.id).await.unwrap();
    assert_eq!(stored.status, OrderStatus::Pending);
    assert_eq!(gallery.reload(ghats.id).await.stock_quantity, 2);
}

#[tokio::test]
async fn test_checkout_rejects_missing_or_empty_cart() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;

    // No cart at all
    let err = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::EmptyCart));
    assert_eq!(err.to_string(), "Cart is empty");

    // Cart exists but holds nothing
    gallery.cart().get(buyer.id).await.unwrap();
    let err = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::EmptyCart));
    assert_eq!(gallery.order_count().await, 0);
}

#[tokio::test]
async fn test_checkout_rejects_unknown_user() {
    let gallery = Gallery::new();
    let err = gallery
        .orders()
        .checkout(canvas_gallery_core::UserId::new(999), &checkout_request())
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::UserNotFound));
}

#[tokio::test]
async fn test_checkout_rejects_blank_address_fields() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    gallery.cart().add(buyer.id, ghats.id, 1).await.unwrap();

    let mut request = checkout_request();
    request.delivery_address.pincode = " ".to_string();
    request.delivery_address.city = String::new();

    let err = gallery
        .orders()
        .checkout(buyer.id, &request)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Delivery address is missing: city, pincode");
    assert_eq!(gallery.cart_size(buyer.id).await, 1);
}

#[tokio::test]
async fn test_unavailable_painting_blocks_checkout_without_changes() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    let lotus = gallery.painting("Lotus Pond", "2750.50", 2).await;

    gallery.cart().add(buyer.id, ghats.id, 1).await.unwrap();
    gallery.cart().add(buyer.id, lotus.id, 1).await.unwrap();
    gallery.withdraw(lotus.id).await;

    let err = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Painting 'Lotus Pond' is no longer available");

    assert_eq!(gallery.reload(ghats.id).await.stock_quantity, 3);
    assert_eq!(gallery.reload(lotus.id).await.stock_quantity, 2);
    assert_eq!(gallery.cart_size(buyer.id).await, 2);
    assert_eq!(gallery.order_count().await, 0);
    assert!(gallery.notifier.sent().is_empty());
}

#[tokio::test]
async fn test_rejected_checkout_is_repeatable() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    gallery.cart().add(buyer.id, ghats.id, 3).await.unwrap();

    // Another buyer takes two of the three
    let other = gallery.user("Kabir", "kabir@example.in").await;
    gallery.cart().add(other.id, ghats.id, 2).await.unwrap();
    gallery
        .orders()
        .checkout(other.id, &checkout_request())
        .await
        .unwrap();

    let first = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap_err();
    let second = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap_err();

    assert_eq!(
        first.to_string(),
        "Insufficient stock for 'Monsoon Ghats'. Available: 1"
    );
    assert_eq!(first.to_string(), second.to_string());
    assert_eq!(gallery.reload(ghats.id).await.stock_quantity, 1);
    assert_eq!(gallery.cart_size(buyer.id).await, 1);
    assert_eq!(gallery.order_count().await, 1);
}

#[tokio::test]
async fn test_first_failing_line_in_cart_order_is_reported() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ok = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    let short = gallery.painting("Lotus Pond", "2750.50", 2).await;
    let gone = gallery.painting("Harbour Lights", "900.00", 1).await;

    gallery.cart().add(buyer.id, ok.id, 1).await.unwrap();
    gallery.cart().add(buyer.id, short.id, 2).await.unwrap();
    gallery.cart().add(buyer.id, gone.id, 1).await.unwrap();

    // Lotus Pond drops to one unit, Harbour Lights is withdrawn
    let other = gallery.user("Kabir", "kabir@example.in").await;
    gallery.cart().add(other.id, short.id, 1).await.unwrap();
    gallery
        .orders()
        .checkout(other.id, &checkout_request())
        .await
        .unwrap();
    gallery.withdraw(gone.id).await;

    let err = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::InsufficientStock { ref title, available: 1 } if title == "Lotus Pond"
    ));
}

#[tokio::test]
async fn test_failure_mid_checkout_rolls_everything_back() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    let lotus = gallery.painting("Lotus Pond", "2750.50", 2).await;

    gallery.cart().add(buyer.id, ghats.id, 2).await.unwrap();
    gallery.cart().add(buyer.id, lotus.id, 1).await.unwrap();

    // Stock for the first line is taken before the second one fails
    gallery.store.fail_sales_of(lotus.id).await;
    let err = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        OrderError::Repository(RepositoryError::DataCorruption(_))
    ));

    let ghats_after = gallery.reload(ghats.id).await;
    assert_eq!(ghats_after.stock_quantity, 3);
    assert_eq!(ghats_after.purchase_count, 0);
    assert_eq!(gallery.reload(lotus.id).await.stock_quantity, 2);
    assert_eq!(gallery.cart_size(buyer.id).await, 2);
    assert_eq!(gallery.order_count().await, 0);
    assert!(gallery.notifier.sent().is_empty());

    // The same cart checks out once the fault is gone
    gallery.store.clear_failures().await;
    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();
    assert_eq!(order.total_amount, money("5750.50"));
}

#[tokio::test]
async fn test_cancellation_restores_stock() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    let lotus = gallery.painting("Lotus Pond", "2750.50", 1).await;

    gallery.cart().add(buyer.id, ghats.id, 2).await.unwrap();
    gallery.cart().add(buyer.id, lotus.id, 1).await.unwrap();
    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();

    let cancelled = gallery.orders().cancel(buyer.id, order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.total_amount, order.total_amount);

    let ghats = gallery.reload(ghats.id).await;
    assert_eq!(ghats.stock_quantity, 3);
    assert!(ghats.is_available);
    let lotus = gallery.reload(lotus.id).await;
    assert_eq!(lotus.stock_quantity, 1);
    assert!(lotus.is_available);
}

#[tokio::test]
async fn test_cancellation_checks_existence_then_owner_then_state() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let stranger = gallery.user("Kabir", "kabir@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    gallery.cart().add(buyer.id, ghats.id, 1).await.unwrap();
    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();

    let err = gallery
        .orders()
        .cancel(buyer.id, OrderId::new(4040))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound));

    let err = gallery
        .orders()
        .cancel(stranger.id, order.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Order does not belong to user");
    assert_eq!(gallery.reload(ghats.id).await.stock_quantity, 2);

    gallery
        .orders()
        .update_status(order.id, OrderStatus::Delivered, None)
        .await
        .unwrap();
    let err = gallery
        .orders()
        .cancel(buyer.id, order.id)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Order cannot be cancelled");
    assert_eq!(gallery.reload(ghats.id).await.stock_quantity, 2);
}

#[tokio::test]
async fn test_cancelling_twice_is_rejected() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    gallery.cart().add(buyer.id, ghats.id, 1).await.unwrap();
    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();

    gallery.orders().cancel(buyer.id, order.id).await.unwrap();
    let err = gallery
        .orders()
        .cancel(buyer.id, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidState));
    assert_eq!(gallery.reload(ghats.id).await.stock_quantity, 3);
}

#[tokio::test]
async fn test_shipped_orders_can_still_be_cancelled() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 1).await;
    gallery.cart().add(buyer.id, ghats.id, 1).await.unwrap();
    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();

    gallery
        .orders()
        .update_status(order.id, OrderStatus::Shipped, Some("BLUEDART 8812"))
        .await
        .unwrap();
    let cancelled = gallery.orders().cancel(buyer.id, order.id).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.tracking_info.as_deref(), Some("BLUEDART 8812"));
    assert_eq!(gallery.reload(ghats.id).await.stock_quantity, 1);
}

#[tokio::test]
async fn test_admin_status_changes_only_move_forward() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 3).await;
    gallery.cart().add(buyer.id, ghats.id, 1).await.unwrap();
    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();
    let orders = gallery.orders();

    let confirmed = orders
        .update_status(order.id, OrderStatus::Confirmed, None)
        .await
        .unwrap();
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let err = orders
        .update_status(order.id, OrderStatus::Pending, None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Cannot change order status from CONFIRMED to PENDING"
    );

    // Re-applying the current status only updates tracking
    let tracked = orders
        .update_status(order.id, OrderStatus::Confirmed, Some("DTDC 1001"))
        .await
        .unwrap();
    assert_eq!(tracked.status, OrderStatus::Confirmed);
    assert_eq!(tracked.tracking_info.as_deref(), Some("DTDC 1001"));

    let delivered = orders
        .update_status(order.id, OrderStatus::Delivered, None)
        .await
        .unwrap();
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.tracking_info.as_deref(), Some("DTDC 1001"));

    let err = orders
        .update_status(order.id, OrderStatus::Cancelled, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidTransition { .. }));
    assert_eq!(gallery.reload(ghats.id).await.stock_quantity, 2);
}

#[tokio::test]
async fn test_admin_cancellation_restocks() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 2).await;
    gallery.cart().add(buyer.id, ghats.id, 2).await.unwrap();
    let order = gallery
        .orders()
        .checkout(buyer.id, &checkout_request())
        .await
        .unwrap();
    assert!(!gallery.reload(ghats.id).await.is_available);

    let cancelled = gallery
        .orders()
        .update_status(order.id, OrderStatus::Cancelled, None)
        .await
        .unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let ghats = gallery.reload(ghats.id).await;
    assert_eq!(ghats.stock_quantity, 2);
    assert!(ghats.is_available);
}

#[tokio::test]
async fn test_orders_are_private_and_listed_newest_first() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let stranger = gallery.user("Kabir", "kabir@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 5).await;

    let mut placed = Vec::new();
    for _ in 0..3 {
        gallery.cart().add(buyer.id, ghats.id, 1).await.unwrap();
        let order = gallery
            .orders()
            .checkout(buyer.id, &checkout_request())
            .await
            .unwrap();
        placed.push(order.id);
    }

    let fetched = gallery.orders().get(buyer.id, placed[0]).await.unwrap();
    assert_eq!(fetched.id, placed[0]);

    let err = gallery
        .orders()
        .get(stranger.id, placed[0])
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Forbidden));

    let err = gallery
        .orders()
        .get(buyer.id, OrderId::new(4040))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::OrderNotFound));

    let page = gallery
        .orders()
        .list(buyer.id, PageRequest::new(Some(0), Some(2)))
        .await
        .unwrap();
    assert_eq!(page.total_items, 3);
    assert_eq!(page.total_pages, 2);
    let ids: Vec<OrderId> = page.items.iter().map(|order| order.id).collect();
    assert_eq!(ids, vec![placed[2], placed[1]]);

    let theirs = gallery
        .orders()
        .list(stranger.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(theirs.total_items, 0);

    // Order numbers stay unique when several land in the same second
    let page = gallery
        .orders()
        .list(buyer.id, PageRequest::new(Some(0), Some(10)))
        .await
        .unwrap();
    let mut numbers: Vec<String> = page
        .items
        .iter()
        .map(|order| order.order_number.to_string())
        .collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 3);
}

#[tokio::test]
async fn test_admin_listing_filters_by_status() {
    let gallery = Gallery::new();
    let buyer = gallery.user("Meera Nair", "meera@example.in").await;
    let ghats = gallery.painting("Monsoon Ghats", "1500.00", 5).await;

    let mut ids = Vec::new();
    for _ in 0..2 {
        gallery.cart().add(buyer.id, ghats.id, 1).await.unwrap();
        let order = gallery
            .orders()
            .checkout(buyer.id, &checkout_request())
            .await
            .unwrap();
        ids.push(order.id);
    }
    gallery.orders().cancel(buyer.id, ids[0]).await.unwrap();

    let cancelled = gallery
        .orders()
        .list_all(Some(OrderStatus::Cancelled), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(cancelled.total_items, 1);
    assert_eq!(cancelled.items[0].id, ids[0]);

    let all = gallery
        .orders()
        .list_all(None, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(all.total_items, 2);
}

#[tokio::test]
async fn test_last_unit_goes_to_first_checkout() {
    let gallery = Gallery::new();
    let meera = gallery.user("Meera Nair", "meera@example.in").await;
    let kabir = gallery.user("Kabir", "kabir@example.in").await;
    let lotus = gallery.painting("Lotus Pond", "2750.50", 1).await;

    gallery.cart().add(meera.id, lotus.id, 1).await.unwrap();
    gallery.cart().add(kabir.id, lotus.id, 1).await.unwrap();

    let orders = gallery.orders();
    let request = checkout_request();
    let (first, second) = tokio::join!(
        orders.checkout(meera.id, &request),
        orders.checkout(kabir.id, &request),
    );

    let winners = [first.is_ok(), second.is_ok()]
        .into_iter()
        .filter(|ok| *ok)
        .count();
    assert_eq!(winners, 1);

    let loser = first.err().or(second.err()).unwrap();
    assert_eq!(
        loser.to_string(),
        "Painting 'Lotus Pond' is no longer available"
    );

    let lotus = gallery.reload(lotus.id).await;
    assert_eq!(lotus.stock_quantity, 0);
    assert!(!lotus.is_available);
    assert_eq!(gallery.order_count().await, 1);
}
