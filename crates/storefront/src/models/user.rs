//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use canvas_gallery_core::{Email, UserId, UserRole};

/// A gallery account.
///
/// The password hash is not part of this type; it is read back only
/// through [`crate::db::UnitOfWork::find_login`] and
/// [`crate::db::UnitOfWork::password_hash`].
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Display name used in greetings and order emails.
    pub name: String,
    /// Normalized login email.
    pub email: Email,
    /// Optional contact number.
    pub phone: Option<String>,
    /// Permission level.
    pub role: UserRole,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Data needed to create an account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    /// Argon2 PHC string.
    pub password_hash: String,
}
