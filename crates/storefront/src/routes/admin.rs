//! Admin handlers. Every handler requires the `ADMIN` role.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;

use canvas_gallery_core::{OrderId, OrderStatus, PaintingId};

use super::paintings::PaintingParams;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{OrderDetails, Page, PageRequest, Painting, PaintingDraft};
use crate::services::admin::DashboardStats;
use crate::state::AppState;

/// Query string of `GET /api/admin/orders`.
#[derive(Debug, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

/// Body of `PUT /api/admin/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
    #[serde(default)]
    pub tracking_info: Option<String>,
}

fn parse_status(raw: &str) -> Result<OrderStatus> {
    raw.parse::<OrderStatus>().map_err(AppError::BadRequest)
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<DashboardStats>> {
    Ok(Json(state.admin().dashboard_stats().await?))
}

pub async fn orders(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<Page<OrderDetails>>> {
    let status = filter.status.as_deref().map(parse_status).transpose()?;
    let page = state
        .orders()
        .list_all(status, PageRequest::new(filter.page, filter.size))
        .await?;
    Ok(Json(page))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<OrderDetails>> {
    let status = parse_status(&update.status)?;
    tracing::info!(admin_id = %admin.id, order_id = %id, status = %status, "Admin status change");
    let order = state
        .orders()
        .update_status(id, status, update.tracking_info.as_deref())
        .await?;
    Ok(Json(order))
}

pub async fn paintings(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(params): Query<PaintingParams>,
) -> Result<Json<Page<Painting>>> {
    let page = state
        .admin()
        .list_paintings(&params.into_query(false))
        .await?;
    Ok(Json(page))
}

pub async fn create_painting(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(draft): Json<PaintingDraft>,
) -> Result<impl IntoResponse> {
    let painting = state.admin().create_painting(&draft).await?;
    Ok((StatusCode::CREATED, Json(painting)))
}

pub async fn update_painting(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<PaintingId>,
    Json(draft): Json<PaintingDraft>,
) -> Result<Json<Painting>> {
    Ok(Json(state.admin().update_painting(id, &draft).await?))
}

pub async fn delete_painting(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<PaintingId>,
) -> Result<StatusCode> {
    state.admin().delete_painting(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
