//! Wishlist handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use canvas_gallery_core::{PaintingId, WishlistItemId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::WishlistView;
use crate::state::AppState;

/// Body of `POST /api/wishlist/add`.
#[derive(Debug, Deserialize)]
pub struct AddToWishlist {
    pub painting_id: PaintingId,
}

#[derive(Debug, Serialize)]
pub struct WishlistCheck {
    pub painting_id: PaintingId,
    pub in_wishlist: bool,
}

#[derive(Debug, Serialize)]
pub struct WishlistCount {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct WishlistCleared {
    pub removed: u64,
}

pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<WishlistView>> {
    Ok(Json(state.wishlist().get(user.id).await?))
}

pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddToWishlist>,
) -> Result<impl IntoResponse> {
    let entry = state.wishlist().add(user.id, body.painting_id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<WishlistItemId>,
) -> Result<StatusCode> {
    state.wishlist().remove(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn check(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(painting_id): Path<PaintingId>,
) -> Result<Json<WishlistCheck>> {
    let in_wishlist = state.wishlist().contains(user.id, painting_id).await?;
    Ok(Json(WishlistCheck {
        painting_id,
        in_wishlist,
    }))
}

pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<WishlistCount>> {
    let count = state.wishlist().count(user.id).await?;
    Ok(Json(WishlistCount { count }))
}

pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<WishlistCleared>> {
    let removed = state.wishlist().clear(user.id).await?;
    Ok(Json(WishlistCleared { removed }))
}
