//! Account self-service handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use canvas_gallery_core::AddressId;

use crate::error::{Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::models::{Address, User};
use crate::services::users::{PasswordChange, Profile, ProfileUpdate, SavedAddressRequest};
use crate::state::AppState;

pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Profile>> {
    Ok(Json(state.users().profile(user.id).await?))
}

pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<User>> {
    Ok(Json(state.users().update_profile(user.id, &body).await?))
}

pub async fn change_password(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<PasswordChange>,
) -> Result<StatusCode> {
    state.users().change_password(user.id, &body).await?;
    add_breadcrumb("auth", "Changed password", None);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<Address>>> {
    Ok(Json(state.users().addresses(user.id).await?))
}

pub async fn add_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<SavedAddressRequest>,
) -> Result<impl IntoResponse> {
    let address = state.users().add_address(user.id, &body).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

pub async fn update_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(body): Json<SavedAddressRequest>,
) -> Result<Json<Address>> {
    Ok(Json(state.users().update_address(user.id, id, &body).await?))
}

pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<StatusCode> {
    state.users().delete_address(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_default_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Address>> {
    Ok(Json(state.users().set_default_address(user.id, id).await?))
}
