//! Database operations for the gallery.
//!
//! # Tables
//!
//! - `users` - Accounts with argon2 password hashes
//! - `addresses` - Saved address books and delivery snapshots, one per checkout
//! - `paintings` - Catalogue with stock and availability
//! - `carts`, `cart_items` - One cart per user
//! - `wishlist_items` - Saved paintings
//! - `orders`, `order_items` - Placed orders with frozen item data
//!
//! Sessions live in the `tower_sessions` schema managed by
//! `tower-sessions-sqlx-store`.
//!
//! # Units of work
//!
//! Every service call runs inside one [`UnitOfWork`] obtained from
//! [`Store::begin`]. Nothing is visible to other units until
//! [`UnitOfWork::commit`]; dropping a unit without committing rolls it back.
//! Methods named `lock_*` take row locks held until the unit ends. Painting
//! locks are always taken in ascending id order.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p canvas-gallery-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use canvas_gallery_core::{
    AddressId, CartId, CartItemId, Email, OrderId, OrderNumber, OrderStatus, PaintingId, UserId,
    UserRole, WishlistItemId,
};

use crate::models::{
    Address, Cart, CartItem, DeliveryAddress, MonthlyRevenue, NewOrder, NewOrderItem, NewUser,
    Order, OrderStats, Page, PageRequest, Painting, PaintingDraft, PaintingQuery, PaintingRank,
    PaintingStats, User, WishlistItem,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Source of units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Start a unit of work.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError>;

    /// Check that the backing store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// One transaction over the gallery's data.
#[async_trait]
pub trait UnitOfWork: Send {
    // Users

    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, RepositoryError>;

    async fn find_user_by_email(&mut self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// A user together with their password hash.
    async fn find_login(&mut self, email: &Email)
    -> Result<Option<(User, String)>, RepositoryError>;

    /// Returns `Conflict` when the email is taken.
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Returns `NotFound` when no such user exists.
    async fn set_user_role(&mut self, id: UserId, role: UserRole) -> Result<(), RepositoryError>;

    async fn count_users(&mut self) -> Result<i64, RepositoryError>;

    /// Accounts created at or after `since`.
    async fn count_users_since(&mut self, since: DateTime<Utc>) -> Result<i64, RepositoryError>;

    /// Returns `NotFound` when no such user exists.
    async fn update_user_profile(
        &mut self,
        id: UserId,
        name: &str,
        phone: Option<&str>,
    ) -> Result<User, RepositoryError>;

    async fn password_hash(&mut self, id: UserId) -> Result<Option<String>, RepositoryError>;

    /// Returns `NotFound` when no such user exists.
    async fn set_password_hash(&mut self, id: UserId, hash: &str) -> Result<(), RepositoryError>;

    // Addresses

    /// Store a checkout snapshot. Snapshots never show up in the address
    /// book and are never edited.
    async fn insert_address(
        &mut self,
        user_id: UserId,
        address: &DeliveryAddress,
    ) -> Result<Address, RepositoryError>;

    /// A user's saved addresses in creation order.
    async fn saved_addresses(&mut self, user_id: UserId) -> Result<Vec<Address>, RepositoryError>;

    /// A saved address by id. Checkout snapshots are not found.
    async fn find_saved_address(
        &mut self,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError>;

    /// Add a non-default address to the user's address book.
    async fn insert_saved_address(
        &mut self,
        user_id: UserId,
        address: &DeliveryAddress,
    ) -> Result<Address, RepositoryError>;

    /// Replace the fields of a saved address. Returns `NotFound` for
    /// snapshots and missing ids.
    async fn update_saved_address(
        &mut self,
        id: AddressId,
        address: &DeliveryAddress,
    ) -> Result<Address, RepositoryError>;

    /// Make `id` the user's only default saved address.
    async fn set_default_address(
        &mut self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<(), RepositoryError>;

    async fn delete_saved_address(&mut self, id: AddressId) -> Result<(), RepositoryError>;

    // Paintings

    async fn find_painting(&mut self, id: PaintingId) -> Result<Option<Painting>, RepositoryError>;

    /// Lock the given paintings, returned in ascending id order. Missing ids
    /// are left out.
    async fn lock_paintings(&mut self, ids: &[PaintingId])
    -> Result<Vec<Painting>, RepositoryError>;

    async fn search_paintings(
        &mut self,
        query: &PaintingQuery,
    ) -> Result<Page<Painting>, RepositoryError>;

    async fn insert_painting(&mut self, draft: &PaintingDraft) -> Result<Painting, RepositoryError>;

    /// Overwrite the editable fields of a painting.
    async fn update_painting(
        &mut self,
        id: PaintingId,
        draft: &PaintingDraft,
    ) -> Result<Painting, RepositoryError>;

    async fn set_painting_available(
        &mut self,
        id: PaintingId,
        available: bool,
    ) -> Result<(), RepositoryError>;

    /// Take `quantity` units out of stock for a sale. Availability turns off
    /// when stock reaches zero and the purchase count grows by `quantity`.
    async fn record_sale(&mut self, id: PaintingId, quantity: i32) -> Result<(), RepositoryError>;

    /// Put `quantity` units back into stock and make the painting available.
    async fn restock(&mut self, id: PaintingId, quantity: i32) -> Result<(), RepositoryError>;

    async fn increment_view_count(&mut self, id: PaintingId) -> Result<(), RepositoryError>;

    /// Counts where every painting not on sale is out of stock.
    async fn painting_stats(&mut self) -> Result<PaintingStats, RepositoryError>;

    /// Available paintings with the highest `rank` score, ties broken by
    /// ascending id.
    async fn top_paintings(
        &mut self,
        rank: PaintingRank,
        limit: i64,
    ) -> Result<Vec<Painting>, RepositoryError>;

    // Carts

    async fn find_cart(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    async fn lock_cart(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError>;

    async fn insert_cart(&mut self, user_id: UserId) -> Result<Cart, RepositoryError>;

    /// Items in insertion order.
    async fn cart_items(&mut self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError>;

    async fn find_cart_item(&mut self, id: CartItemId)
    -> Result<Option<CartItem>, RepositoryError>;

    async fn insert_cart_item(
        &mut self,
        cart_id: CartId,
        painting_id: PaintingId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError>;

    async fn set_cart_item_quantity(
        &mut self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError>;

    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<(), RepositoryError>;

    /// Remove every item; returns how many were removed.
    async fn clear_cart(&mut self, cart_id: CartId) -> Result<u64, RepositoryError>;

    // Wishlists

    /// Items newest first.
    async fn wishlist_items(&mut self, user_id: UserId)
    -> Result<Vec<WishlistItem>, RepositoryError>;

    async fn find_wishlist_item(
        &mut self,
        id: WishlistItemId,
    ) -> Result<Option<WishlistItem>, RepositoryError>;

    async fn find_wishlist_entry(
        &mut self,
        user_id: UserId,
        painting_id: PaintingId,
    ) -> Result<Option<WishlistItem>, RepositoryError>;

    /// Returns `Conflict` when the painting is already saved.
    async fn insert_wishlist_item(
        &mut self,
        user_id: UserId,
        painting_id: PaintingId,
    ) -> Result<WishlistItem, RepositoryError>;

    async fn delete_wishlist_item(&mut self, id: WishlistItemId) -> Result<(), RepositoryError>;

    async fn clear_wishlist(&mut self, user_id: UserId) -> Result<u64, RepositoryError>;

    async fn count_wishlist(&mut self, user_id: UserId) -> Result<i64, RepositoryError>;

    // Orders

    async fn order_number_exists(&mut self, number: &OrderNumber)
    -> Result<bool, RepositoryError>;

    /// Insert an order and its items. Returns `Conflict` on a duplicate
    /// order number.
    async fn insert_order(
        &mut self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError>;

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// A user's orders, newest first.
    async fn list_user_orders(
        &mut self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError>;

    /// All orders, newest first, optionally filtered by status.
    async fn list_orders(
        &mut self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError>;

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        tracking_info: Option<&str>,
    ) -> Result<(), RepositoryError>;

    async fn order_stats(&mut self) -> Result<OrderStats, RepositoryError>;

    /// Total of orders placed at or after `since` that were not cancelled.
    async fn revenue_since(&mut self, since: DateTime<Utc>) -> Result<Decimal, RepositoryError>;

    /// Revenue per UTC calendar month over orders that were not cancelled,
    /// newest month first, at most `months` entries.
    async fn monthly_revenue(&mut self, months: i64)
    -> Result<Vec<MonthlyRevenue>, RepositoryError>;

    /// Make every change in this unit visible.
    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}
