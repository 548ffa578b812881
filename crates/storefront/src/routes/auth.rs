//! Authentication route handlers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::{AuthError, Registration};
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

async fn start_session(session: &Session, user: &User) -> Result<()> {
    set_current_user(session, &CurrentUser::from(user))
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));
    Ok(())
}

/// Create an account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(registration): Json<Registration>,
) -> Result<impl IntoResponse> {
    let user = state.auth().register(&registration).await?;
    start_session(&session, &user).await?;
    add_breadcrumb("auth", "Registered", None);
    Ok((StatusCode::CREATED, Json(user)))
}

/// Sign in with email and password.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<LoginRequest>,
) -> Result<Json<User>> {
    let user = match state.auth().login(&request.email, &request.password).await {
        Ok(user) => user,
        Err(err @ AuthError::InvalidCredentials) => {
            tracing::info!("Failed login attempt");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    start_session(&session, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(user))
}

/// Sign out.
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user's profile.
pub async fn me(State(state): State<AppState>, RequireAuth(current): RequireAuth) -> Result<Json<User>> {
    let user = state.auth().get_user(current.id).await.map_err(|e| match e {
        AuthError::UserNotFound => AppError::Unauthorized("Account no longer exists".to_string()),
        other => other.into(),
    })?;
    Ok(Json(user))
}
