//! Shopping cart types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use canvas_gallery_core::{CartId, CartItemId, CurrencyCode, PaintingId, UserId, line_total};

use super::Painting;

/// A user's cart. Each user has at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: CartId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One painting in a cart. A painting appears at most once per cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub painting_id: PaintingId,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

/// A cart line joined with the painting it refers to.
#[derive(Debug, Clone, Serialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub painting_id: PaintingId,
    pub title: String,
    pub artist_name: String,
    pub price: Decimal,
    pub currency: CurrencyCode,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub is_available: bool,
    pub stock_quantity: i32,
}

impl CartLine {
    #[must_use]
    pub fn new(item: &CartItem, painting: &Painting) -> Self {
        Self {
            id: item.id,
            painting_id: painting.id,
            title: painting.title.clone(),
            artist_name: painting.artist_name.clone(),
            price: painting.price,
            currency: painting.currency,
            quantity: item.quantity,
            subtotal: line_total(painting.price, item.quantity),
            is_available: painting.is_available,
            stock_quantity: painting.stock_quantity,
        }
    }
}

/// Cart contents with totals.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub items: Vec<CartLine>,
    pub total_amount: Decimal,
    pub total_items: i64,
    pub currency: CurrencyCode,
}

impl CartView {
    #[must_use]
    pub fn new(id: CartId, items: Vec<CartLine>) -> Self {
        let total_amount = items.iter().map(|line| line.subtotal).sum();
        let total_items = items.iter().map(|line| i64::from(line.quantity)).sum();
        Self {
            id,
            items,
            total_amount,
            total_items,
            currency: CurrencyCode::INR,
        }
    }
}
