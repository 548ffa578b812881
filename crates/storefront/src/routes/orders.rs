//! Order handlers for buyers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use canvas_gallery_core::OrderId;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{CheckoutRequest, OrderDetails, Page, PageRequest};
use crate::state::AppState;

/// `page`/`size` query string.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageParams {
    #[must_use]
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.size)
    }
}

/// Check out the caller's cart.
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    add_breadcrumb("checkout", "Placing order", None);
    let order = state.orders().checkout(user.id, &request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<OrderDetails>>> {
    Ok(Json(state.orders().list(user.id, params.request()).await?))
}

pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetails>> {
    Ok(Json(state.orders().get(user.id, id).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetails>> {
    Ok(Json(state.orders().cancel(user.id, id).await?))
}
