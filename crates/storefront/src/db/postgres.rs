//! `PostgreSQL` implementation of the store.
//!
//! Queries are plain runtime `sqlx` queries mapped with `FromRow`; each unit
//! of work owns one transaction.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use canvas_gallery_core::{
    AddressId, CartId, CartItemId, CurrencyCode, Email, OrderId, OrderNumber, OrderStatus,
    PaintingId, PaymentMethod, UserId, UserRole, WishlistItemId,
};

use super::{RepositoryError, Store, UnitOfWork};
use crate::models::{
    Address, Cart, CartItem, DeliveryAddress, MonthlyRevenue, NewOrder, NewOrderItem, NewUser,
    Order, OrderItem, OrderStats, Page, PageRequest, Painting, PaintingDraft, PaintingQuery,
    PaintingRank, PaintingSort, PaintingStats, User, WishlistItem,
};

const USER_COLUMNS: &str = "id, name, email, phone, role, created_at, updated_at";

const PAINTING_COLUMNS: &str = "id, title, artist_name, description, medium, height_cm, \
     width_cm, depth_cm, year_created, price, currency, stock_quantity, is_available, \
     view_count, purchase_count, created_at, updated_at";

const ADDRESS_COLUMNS: &str =
    "id, user_id, street, city, state, country, pincode, is_default, is_saved, created_at";

const ORDER_COLUMNS: &str = "id, order_number, user_id, total_amount, currency, \
     delivery_address_id, status, payment_method, tracking_info, notes, created_at, updated_at";

const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, painting_id, quantity, price_at_purchase, painting_title, artist_name";

/// Shared `WHERE` clause for catalogue searches.
///
/// `$1` pattern, `$2` min price, `$3` max price, `$4` available only.
const PAINTING_FILTER: &str = "($1::TEXT IS NULL OR title ILIKE $1 OR artist_name ILIKE $1) \
     AND ($2::NUMERIC IS NULL OR price >= $2) \
     AND ($3::NUMERIC IS NULL OR price <= $3) \
     AND (NOT $4 OR is_available)";

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// A unit of work over one `PostgreSQL` transaction.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[derive(sqlx::FromRow)]
struct LoginRow {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    order_number: OrderNumber,
    user_id: UserId,
    total_amount: Decimal,
    currency: CurrencyCode,
    delivery_address_id: AddressId,
    status: OrderStatus,
    payment_method: PaymentMethod,
    tracking_info: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Map a unique-constraint violation to `Conflict`.
fn map_unique(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(err)
}

/// Fail with `NotFound` when an update touched nothing.
fn expect_row(rows_affected: u64) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}

/// Escape `ILIKE` wildcards so user text matches literally.
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

const fn sort_clause(sort: PaintingSort) -> &'static str {
    match sort {
        PaintingSort::Newest => "created_at DESC, id DESC",
        PaintingSort::PriceAsc => "price ASC, id ASC",
        PaintingSort::PriceDesc => "price DESC, id ASC",
        PaintingSort::Popular => "purchase_count DESC, view_count DESC, id ASC",
    }
}

const fn rank_clause(rank: PaintingRank) -> &'static str {
    match rank {
        PaintingRank::MostViewed => "view_count DESC, id ASC",
        PaintingRank::BestSelling => "purchase_count DESC, id ASC",
    }
}

impl PgUnitOfWork {
    /// Attach items and addresses to order rows, keeping row order.
    async fn hydrate(&mut self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<i32> = rows.iter().map(|r| r.id.as_i32()).collect();
        let address_ids: Vec<i32> = rows.iter().map(|r| r.delivery_address_id.as_i32()).collect();

        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = ANY($1) ORDER BY id"
        ))
        .bind(&order_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = ANY($1)"
        ))
        .bind(&address_ids)
        .fetch_all(&mut *self.tx)
        .await?;

        let mut items_by_order: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
        for item in items {
            items_by_order.entry(item.order_id).or_default().push(item);
        }
        let addresses: HashMap<AddressId, Address> =
            addresses.into_iter().map(|a| (a.id, a)).collect();

        rows.into_iter()
            .map(|row| {
                let delivery_address = addresses
                    .get(&row.delivery_address_id)
                    .cloned()
                    .ok_or_else(|| {
                        RepositoryError::DataCorruption(format!(
                            "order {} references missing address {}",
                            row.id, row.delivery_address_id
                        ))
                    })?;
                Ok(Order {
                    id: row.id,
                    items: items_by_order.remove(&row.id).unwrap_or_default(),
                    order_number: row.order_number,
                    user_id: row.user_id,
                    total_amount: row.total_amount,
                    currency: row.currency,
                    delivery_address,
                    status: row.status,
                    payment_method: row.payment_method,
                    tracking_info: row.tracking_info,
                    notes: row.notes,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })
            })
            .collect()
    }

    async fn fetch_order(
        &mut self,
        id: OrderId,
        for_update: bool,
    ) -> Result<Option<Order>, RepositoryError> {
        let lock = if for_update { " FOR UPDATE" } else { "" };
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1{lock}"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_user(&mut self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn find_user_by_email(&mut self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(user)
    }

    async fn find_login(
        &mut self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, LoginRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    async fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, phone, password_hash) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_unique(e, "email already exists"))
    }

    async fn set_user_role(&mut self, id: UserId, role: UserRole) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(role)
                .execute(&mut *self.tx)
                .await?;
        expect_row(result.rows_affected())
    }

    async fn count_users(&mut self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count)
    }

    async fn count_users_since(&mut self, since: DateTime<Utc>) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE created_at >= $1")
                .bind(since)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(count)
    }

    async fn update_user_profile(
        &mut self,
        id: UserId,
        name: &str,
        phone: Option<&str>,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET name = $2, phone = $3, updated_at = NOW() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(phone)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn password_hash(&mut self, id: UserId) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(hash)
    }

    async fn set_password_hash(&mut self, id: UserId, hash: &str) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(hash)
                .execute(&mut *self.tx)
                .await?;
        expect_row(result.rows_affected())
    }

    async fn insert_address(
        &mut self,
        user_id: UserId,
        address: &DeliveryAddress,
    ) -> Result<Address, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "INSERT INTO addresses \
             (user_id, street, city, state, country, pincode, is_default, is_saved) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE, FALSE) RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.pincode)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(address)
    }

    async fn saved_addresses(&mut self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let addresses = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 AND is_saved ORDER BY id"
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(addresses)
    }

    async fn find_saved_address(
        &mut self,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE id = $1 AND is_saved FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(address)
    }

    async fn insert_saved_address(
        &mut self,
        user_id: UserId,
        address: &DeliveryAddress,
    ) -> Result<Address, RepositoryError> {
        let address = sqlx::query_as::<_, Address>(&format!(
            "INSERT INTO addresses \
             (user_id, street, city, state, country, pincode, is_default, is_saved) \
             VALUES ($1, $2, $3, $4, $5, $6, FALSE, TRUE) RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.pincode)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(address)
    }

    async fn update_saved_address(
        &mut self,
        id: AddressId,
        address: &DeliveryAddress,
    ) -> Result<Address, RepositoryError> {
        sqlx::query_as::<_, Address>(&format!(
            "UPDATE addresses \
             SET street = $2, city = $3, state = $4, country = $5, pincode = $6 \
             WHERE id = $1 AND is_saved RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(id)
        .bind(&address.street)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.pincode)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn set_default_address(
        &mut self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<(), RepositoryError> {
        // Clear first: the one-default index is checked row by row.
        sqlx::query(
            "UPDATE addresses SET is_default = FALSE \
             WHERE user_id = $1 AND is_saved AND is_default AND id <> $2",
        )
        .bind(user_id)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;

        let result = sqlx::query(
            "UPDATE addresses SET is_default = TRUE WHERE id = $2 AND user_id = $1 AND is_saved",
        )
        .bind(user_id)
        .bind(id)
        .execute(&mut *self.tx)
        .await?;
        expect_row(result.rows_affected())
    }

    async fn delete_saved_address(&mut self, id: AddressId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $1 AND is_saved")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        expect_row(result.rows_affected())
    }

    async fn find_painting(&mut self, id: PaintingId) -> Result<Option<Painting>, RepositoryError> {
        let painting = sqlx::query_as::<_, Painting>(&format!(
            "SELECT {PAINTING_COLUMNS} FROM paintings WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(painting)
    }

    async fn lock_paintings(
        &mut self,
        ids: &[PaintingId],
    ) -> Result<Vec<Painting>, RepositoryError> {
        let mut ids: Vec<i32> = ids.iter().map(PaintingId::as_i32).collect();
        ids.sort_unstable();
        ids.dedup();

        let paintings = sqlx::query_as::<_, Painting>(&format!(
            "SELECT {PAINTING_COLUMNS} FROM paintings WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(paintings)
    }

    async fn search_paintings(
        &mut self,
        query: &PaintingQuery,
    ) -> Result<Page<Painting>, RepositoryError> {
        let pattern = query
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(like_pattern);

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM paintings WHERE {PAINTING_FILTER}"
        ))
        .bind(&pattern)
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(query.available_only)
        .fetch_one(&mut *self.tx)
        .await?;

        let paintings = sqlx::query_as::<_, Painting>(&format!(
            "SELECT {PAINTING_COLUMNS} FROM paintings WHERE {PAINTING_FILTER} \
             ORDER BY {} LIMIT $5 OFFSET $6",
            sort_clause(query.sort)
        ))
        .bind(&pattern)
        .bind(query.min_price)
        .bind(query.max_price)
        .bind(query.available_only)
        .bind(query.page.limit())
        .bind(query.page.offset())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(Page::new(paintings, query.page, total))
    }

    async fn insert_painting(&mut self, draft: &PaintingDraft) -> Result<Painting, RepositoryError> {
        let painting = sqlx::query_as::<_, Painting>(&format!(
            "INSERT INTO paintings (title, artist_name, description, medium, height_cm, \
             width_cm, depth_cm, year_created, price, stock_quantity, is_available) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {PAINTING_COLUMNS}"
        ))
        .bind(&draft.title)
        .bind(&draft.artist_name)
        .bind(&draft.description)
        .bind(&draft.medium)
        .bind(draft.height_cm)
        .bind(draft.width_cm)
        .bind(draft.depth_cm)
        .bind(draft.year_created)
        .bind(draft.price)
        .bind(draft.stock_quantity)
        .bind(draft.is_available)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(painting)
    }

    async fn update_painting(
        &mut self,
        id: PaintingId,
        draft: &PaintingDraft,
    ) -> Result<Painting, RepositoryError> {
        sqlx::query_as::<_, Painting>(&format!(
            "UPDATE paintings SET title = $2, artist_name = $3, description = $4, medium = $5, \
             height_cm = $6, width_cm = $7, depth_cm = $8, year_created = $9, price = $10, \
             stock_quantity = $11, is_available = $12, updated_at = NOW() \
             WHERE id = $1 RETURNING {PAINTING_COLUMNS}"
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(&draft.artist_name)
        .bind(&draft.description)
        .bind(&draft.medium)
        .bind(draft.height_cm)
        .bind(draft.width_cm)
        .bind(draft.depth_cm)
        .bind(draft.year_created)
        .bind(draft.price)
        .bind(draft.stock_quantity)
        .bind(draft.is_available)
        .fetch_optional(&mut *self.tx)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn set_painting_available(
        &mut self,
        id: PaintingId,
        available: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE paintings SET is_available = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(available)
        .execute(&mut *self.tx)
        .await?;
        expect_row(result.rows_affected())
    }

    async fn record_sale(&mut self, id: PaintingId, quantity: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE paintings
            SET stock_quantity = stock_quantity - $2,
                is_available = CASE WHEN stock_quantity - $2 = 0 THEN FALSE ELSE is_available END,
                purchase_count = purchase_count + $2,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(quantity)
        .execute(&mut *self.tx)
        .await?;
        expect_row(result.rows_affected())
    }

    async fn restock(&mut self, id: PaintingId, quantity: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE paintings
            SET stock_quantity = stock_quantity + $2,
                is_available = TRUE,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(quantity)
        .execute(&mut *self.tx)
        .await?;
        expect_row(result.rows_affected())
    }

    async fn increment_view_count(&mut self, id: PaintingId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE paintings SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        expect_row(result.rows_affected())
    }

    async fn painting_stats(&mut self) -> Result<PaintingStats, RepositoryError> {
        let (total_paintings, available_paintings) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_available) FROM paintings",
        )
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(PaintingStats::new(total_paintings, available_paintings))
    }

    async fn top_paintings(
        &mut self,
        rank: PaintingRank,
        limit: i64,
    ) -> Result<Vec<Painting>, RepositoryError> {
        let order = rank_clause(rank);
        let paintings = sqlx::query_as::<_, Painting>(&format!(
            "SELECT {PAINTING_COLUMNS} FROM paintings WHERE is_available \
             ORDER BY {order} LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(paintings)
    }

    async fn find_cart(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(cart)
    }

    async fn lock_cart(&mut self, user_id: UserId) -> Result<Option<Cart>, RepositoryError> {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(cart)
    }

    async fn insert_cart(&mut self, user_id: UserId) -> Result<Cart, RepositoryError> {
        sqlx::query_as::<_, Cart>(
            "INSERT INTO carts (user_id) VALUES ($1) RETURNING id, user_id, created_at, updated_at",
        )
        .bind(user_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_unique(e, "cart already exists"))
    }

    async fn cart_items(&mut self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let items = sqlx::query_as::<_, CartItem>(
            "SELECT id, cart_id, painting_id, quantity, added_at FROM cart_items \
             WHERE cart_id = $1 ORDER BY id",
        )
        .bind(cart_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(items)
    }

    async fn find_cart_item(
        &mut self,
        id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let item = sqlx::query_as::<_, CartItem>(
            "SELECT id, cart_id, painting_id, quantity, added_at FROM cart_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(item)
    }

    async fn insert_cart_item(
        &mut self,
        cart_id: CartId,
        painting_id: PaintingId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        sqlx::query_as::<_, CartItem>(
            "INSERT INTO cart_items (cart_id, painting_id, quantity) VALUES ($1, $2, $3) \
             RETURNING id, cart_id, painting_id, quantity, added_at",
        )
        .bind(cart_id)
        .bind(painting_id)
        .bind(quantity)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_unique(e, "painting already in cart"))
    }

    async fn set_cart_item_quantity(
        &mut self,
        id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
            .bind(id)
            .bind(quantity)
            .execute(&mut *self.tx)
            .await?;
        expect_row(result.rows_affected())
    }

    async fn delete_cart_item(&mut self, id: CartItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        expect_row(result.rows_affected())
    }

    async fn clear_cart(&mut self, cart_id: CartId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn wishlist_items(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<WishlistItem>, RepositoryError> {
        let items = sqlx::query_as::<_, WishlistItem>(
            "SELECT id, user_id, painting_id, added_at FROM wishlist_items \
             WHERE user_id = $1 ORDER BY added_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(items)
    }

    async fn find_wishlist_item(
        &mut self,
        id: WishlistItemId,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let item = sqlx::query_as::<_, WishlistItem>(
            "SELECT id, user_id, painting_id, added_at FROM wishlist_items WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(item)
    }

    async fn find_wishlist_entry(
        &mut self,
        user_id: UserId,
        painting_id: PaintingId,
    ) -> Result<Option<WishlistItem>, RepositoryError> {
        let item = sqlx::query_as::<_, WishlistItem>(
            "SELECT id, user_id, painting_id, added_at FROM wishlist_items \
             WHERE user_id = $1 AND painting_id = $2",
        )
        .bind(user_id)
        .bind(painting_id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(item)
    }

    async fn insert_wishlist_item(
        &mut self,
        user_id: UserId,
        painting_id: PaintingId,
    ) -> Result<WishlistItem, RepositoryError> {
        sqlx::query_as::<_, WishlistItem>(
            "INSERT INTO wishlist_items (user_id, painting_id) VALUES ($1, $2) \
             RETURNING id, user_id, painting_id, added_at",
        )
        .bind(user_id)
        .bind(painting_id)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_unique(e, "painting already in wishlist"))
    }

    async fn delete_wishlist_item(&mut self, id: WishlistItemId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        expect_row(result.rows_affected())
    }

    async fn clear_wishlist(&mut self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *self.tx)
            .await?;
        Ok(result.rows_affected())
    }

    async fn count_wishlist(&mut self, user_id: UserId) -> Result<i64, RepositoryError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM wishlist_items WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&mut *self.tx)
                .await?;
        Ok(count)
    }

    async fn order_number_exists(
        &mut self,
        number: &OrderNumber,
    ) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM orders WHERE order_number = $1)",
        )
        .bind(number)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(exists)
    }

    async fn insert_order(
        &mut self,
        order: &NewOrder,
        items: &[NewOrderItem],
    ) -> Result<Order, RepositoryError> {
        let id = sqlx::query_scalar::<_, OrderId>(
            r"
            INSERT INTO orders (order_number, user_id, total_amount, currency,
                                delivery_address_id, status, payment_method, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(&order.order_number)
        .bind(order.user_id)
        .bind(order.total_amount)
        .bind(order.currency)
        .bind(order.delivery_address_id)
        .bind(order.status)
        .bind(order.payment_method)
        .bind(&order.notes)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(|e| map_unique(e, "order number already exists"))?;

        for item in items {
            sqlx::query(
                r"
                INSERT INTO order_items (order_id, painting_id, quantity, price_at_purchase,
                                         painting_title, artist_name)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(id)
            .bind(item.painting_id)
            .bind(item.quantity)
            .bind(item.price_at_purchase)
            .bind(&item.painting_title)
            .bind(&item.artist_name)
            .execute(&mut *self.tx)
            .await?;
        }

        self.fetch_order(id, false).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!("order {id} missing after insert"))
        })
    }

    async fn find_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.fetch_order(id, false).await
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        self.fetch_order(id, true).await
    }

    async fn list_user_orders(
        &mut self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&mut *self.tx)
            .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(user_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(Page::new(self.hydrate(rows).await?, page, total))
    }

    async fn list_orders(
        &mut self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<Order>, RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE ($1::order_status IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&mut *self.tx)
        .await?;

        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE ($1::order_status IS NULL OR status = $1) \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(Page::new(self.hydrate(rows).await?, page, total))
    }

    async fn update_order_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
        tracking_info: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = $2,
                tracking_info = COALESCE($3, tracking_info),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .bind(tracking_info)
        .execute(&mut *self.tx)
        .await?;
        expect_row(result.rows_affected())
    }

    async fn order_stats(&mut self) -> Result<OrderStats, RepositoryError> {
        let rows = sqlx::query_as::<_, (OrderStatus, i64, Decimal)>(
            "SELECT status, COUNT(*), COALESCE(SUM(total_amount), 0) FROM orders GROUP BY status",
        )
        .fetch_all(&mut *self.tx)
        .await?;

        let mut stats = OrderStats::default();
        for (status, count, total) in rows {
            stats.record(status, total, count);
        }
        Ok(stats)
    }

    async fn revenue_since(&mut self, since: DateTime<Utc>) -> Result<Decimal, RepositoryError> {
        let revenue = sqlx::query_scalar::<_, Decimal>(
            "SELECT COALESCE(SUM(total_amount), 0) FROM orders \
             WHERE status <> 'CANCELLED' AND created_at >= $1",
        )
        .bind(since)
        .fetch_one(&mut *self.tx)
        .await?;
        Ok(revenue)
    }

    async fn monthly_revenue(
        &mut self,
        months: i64,
    ) -> Result<Vec<MonthlyRevenue>, RepositoryError> {
        let rows = sqlx::query_as::<_, (i32, i32, Decimal, i64)>(
            r"
            SELECT EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::INT,
                   EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::INT,
                   SUM(total_amount),
                   COUNT(*)
            FROM orders
            WHERE status <> 'CANCELLED'
            GROUP BY 1, 2
            ORDER BY 1 DESC, 2 DESC
            LIMIT $1
            ",
        )
        .bind(months)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter()
            .map(|(year, month, revenue, count)| {
                let month = u32::try_from(month).map_err(|_| {
                    RepositoryError::DataCorruption(format!("month {month} out of range"))
                })?;
                Ok(MonthlyRevenue::new(year, month, revenue, count))
            })
            .collect()
    }

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
