//! HTTP round trips against a running storefront.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (gallery-cli migrate)
//! - The storefront running (cargo run -p canvas-gallery-storefront)
//! - `GALLERY_TEST_DATABASE_URL` pointing at the same database, for fixtures
//!
//! Run with: cargo test -p canvas-gallery-integration-tests -- --ignored

use reqwest::{Client, StatusCode};
use serde_json::{Value, json};

use canvas_gallery_integration_tests::{
    base_url, insert_painting, test_pool, unique_email, unique_title,
};
use canvas_gallery_storefront::db::PgStore;

/// A client that keeps the session cookie between requests.
fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

async fn register(client: &Client) -> Value {
    let resp = client
        .post(format!("{}/api/auth/register", base_url()))
        .json(&json!({
            "name": "Integration Buyer",
            "email": unique_email("api"),
            "password": "monsoon-ghats",
        }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(resp.status(), StatusCode::CREATED);
    resp.json().await.expect("Invalid register response")
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_health() {
    let resp = client()
        .get(format!("{}/health/ready", base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(resp.headers().contains_key("x-request-id"));
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_orders_require_login() {
    let resp = client()
        .get(format!("{}/api/orders", base_url()))
        .send()
        .await
        .expect("Failed to reach storefront");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running storefront and database"]
async fn test_checkout_over_http() {
    let store = PgStore::new(test_pool().await);
    let painting = insert_painting(&store, &unique_title("Harbour Lights"), "900.00", 1).await;

    let client = client();
    let user = register(&client).await;
    assert_eq!(user["role"], "CUSTOMER");

    let resp = client
        .post(format!("{}/api/cart/add", base_url()))
        .json(&json!({ "painting_id": painting.id }))
        .send()
        .await
        .expect("Failed to add to cart");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{}/api/orders", base_url()))
        .json(&json!({
            "delivery_address": {
                "street": "12 MG Road",
                "city": "Bengaluru",
                "state": "Karnataka",
                "country": "India",
                "pincode": "560001"
            }
        }))
        .send()
        .await
        .expect("Failed to check out");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let order: Value = resp.json().await.expect("Invalid order response");
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["total_amount"], "900.00");
    assert!(
        order["order_number"]
            .as_str()
            .is_some_and(|n| n.starts_with("TC"))
    );

    let resp = client
        .get(format!("{}/api/paintings/{}", base_url(), painting.id))
        .send()
        .await
        .expect("Failed to fetch painting");
    let body: Value = resp.json().await.expect("Invalid painting response");
    assert_eq!(body["stock_quantity"], 0);
    assert_eq!(body["is_available"], false);
}
