//! Integration tests for Canvas Gallery.
//!
//! # Running Tests
//!
//! ```bash
//! # Database tests: a scratch PostgreSQL database, migrated on connect
//! export GALLERY_TEST_DATABASE_URL=postgres://localhost/gallery_test
//! cargo test -p canvas-gallery-integration-tests -- --ignored
//!
//! # API tests additionally need a running storefront
//! export GALLERY_TEST_BASE_URL=http://localhost:8080
//! ```
//!
//! # Test Categories
//!
//! - `postgres_store` - Checkout and cancellation through `PgStore`, including
//!   concurrent buyers racing for the last unit
//! - `storefront_api` - HTTP round trips against a live server
//!
//! Every test creates its own users and paintings with unique names, so the
//! database never needs resetting between runs.

use std::str::FromStr;

use rust_decimal::Decimal;
use secrecy::SecretString;
use sqlx::PgPool;
use uuid::Uuid;

use canvas_gallery_core::{Email, UserId};
use canvas_gallery_storefront::db::{PgStore, Store, create_pool};
use canvas_gallery_storefront::models::{
    AdminContact, CheckoutRequest, DeliveryAddress, NewUser, Painting, PaintingDraft,
};

/// Connect to the test database and apply migrations.
///
/// # Panics
///
/// Panics if `GALLERY_TEST_DATABASE_URL` is unset or the database is
/// unreachable.
pub async fn test_pool() -> PgPool {
    let url = std::env::var("GALLERY_TEST_DATABASE_URL")
        .expect("GALLERY_TEST_DATABASE_URL must point at a scratch database");
    let pool = create_pool(&SecretString::from(url))
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("../storefront/migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

/// Base URL of a running storefront.
#[must_use]
pub fn base_url() -> String {
    std::env::var("GALLERY_TEST_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string())
}

/// A unique, valid email address.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.in", Uuid::new_v4().simple())
}

/// A unique painting title.
#[must_use]
pub fn unique_title(prefix: &str) -> String {
    format!("{prefix} {}", Uuid::new_v4().simple())
}

#[must_use]
pub fn admin_contact() -> AdminContact {
    AdminContact {
        name: "Gallery Desk".to_string(),
        email: "desk@canvasgallery.in".to_string(),
        phone: "+91 98450 12345".to_string(),
    }
}

#[must_use]
pub fn checkout_request() -> CheckoutRequest {
    CheckoutRequest {
        delivery_address: DeliveryAddress {
            street: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "Karnataka".to_string(),
            country: "India".to_string(),
            pincode: "560001".to_string(),
        },
        notes: None,
    }
}

/// Insert a customer directly.
///
/// # Panics
///
/// Panics on any database error.
pub async fn insert_user(store: &PgStore, name: &str) -> UserId {
    let mut uow = store.begin().await.expect("begin");
    let user = uow
        .insert_user(&NewUser {
            name: name.to_string(),
            email: Email::parse(&unique_email("buyer")).expect("valid email"),
            phone: None,
            password_hash: "unused".to_string(),
        })
        .await
        .expect("insert user");
    uow.commit().await.expect("commit");
    user.id
}

/// Insert a painting directly.
///
/// # Panics
///
/// Panics on any database error or a malformed price.
pub async fn insert_painting(store: &PgStore, title: &str, price: &str, stock: i32) -> Painting {
    let mut uow = store.begin().await.expect("begin");
    let painting = uow
        .insert_painting(&PaintingDraft {
            title: title.to_string(),
            artist_name: "Integration Artist".to_string(),
            description: None,
            medium: Some("Oil on canvas".to_string()),
            height_cm: None,
            width_cm: None,
            depth_cm: None,
            year_created: None,
            price: Decimal::from_str(price).expect("valid price"),
            stock_quantity: stock,
            is_available: stock > 0,
        })
        .await
        .expect("insert painting");
    uow.commit().await.expect("commit");
    painting
}
