//! Cart handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;

use canvas_gallery_core::{CartItemId, PaintingId};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::CartView;
use crate::state::AppState;

/// Body of `POST /api/cart/add`.
#[derive(Debug, Deserialize)]
pub struct AddToCart {
    pub painting_id: PaintingId,
    #[serde(default = "one")]
    pub quantity: i32,
}

const fn one() -> i32 {
    1
}

/// Body of `PUT /api/cart/items/{id}`.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantity {
    pub quantity: i32,
}

pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(state.cart().get(user.id).await?))
}

pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddToCart>,
) -> Result<Json<CartView>> {
    let cart = state
        .cart()
        .add(user.id, body.painting_id, body.quantity)
        .await?;
    Ok(Json(cart))
}

pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CartItemId>,
    Json(body): Json<UpdateQuantity>,
) -> Result<Json<CartView>> {
    Ok(Json(
        state.cart().update_item(user.id, id, body.quantity).await?,
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CartItemId>,
) -> Result<Json<CartView>> {
    Ok(Json(state.cart().remove_item(user.id, id).await?))
}

pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<CartView>> {
    Ok(Json(state.cart().clear(user.id).await?))
}
