//! User role management.
//!
//! # Usage
//!
//! ```bash
//! gallery-cli admin promote -e owner@canvasgallery.in
//! gallery-cli admin demote -e former-staff@canvasgallery.in
//! ```
//!
//! The account must already exist (register through the API first). The new
//! role takes effect at the user's next login.

use thiserror::Error;

use canvas_gallery_core::{Email, EmailError, UserRole};
use canvas_gallery_storefront::db::{PgStore, RepositoryError, Store};

use super::{CommandError, connect};

/// Errors that can occur during role changes.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("No user registered with email: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Set the role of the user registered with `email`.
///
/// # Errors
///
/// Returns an error if the email is malformed, no such user exists, or the
/// database fails.
pub async fn set_role(email: &str, role: UserRole) -> Result<(), AdminError> {
    let email = Email::parse(email)?;
    let store = PgStore::new(connect().await?);

    let mut uow = store.begin().await?;
    let user = uow
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AdminError::UserNotFound(email.to_string()))?;

    if user.role == role {
        tracing::info!(user_id = %user.id, %role, "User already has this role");
        return Ok(());
    }

    uow.set_user_role(user.id, role).await?;
    uow.commit().await?;

    tracing::info!(
        user_id = %user.id,
        email = %email,
        from = %user.role,
        to = %role,
        "Role updated"
    );
    Ok(())
}
