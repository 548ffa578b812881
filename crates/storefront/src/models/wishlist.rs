//! Wishlist types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use canvas_gallery_core::{PaintingId, UserId, WishlistItemId};

use super::Painting;

/// A saved painting. Unique per (user, painting).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct WishlistItem {
    pub id: WishlistItemId,
    pub user_id: UserId,
    pub painting_id: PaintingId,
    pub added_at: DateTime<Utc>,
}

/// A wishlist entry with its painting.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistEntry {
    pub id: WishlistItemId,
    pub added_at: DateTime<Utc>,
    pub painting: Painting,
}

/// A user's wishlist, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct WishlistView {
    pub items: Vec<WishlistEntry>,
    pub total_items: usize,
}
