//! Account self-service: profile, password and address book.
//!
//! Saved addresses are never referenced by orders. Checkout copies the
//! submitted fields into a snapshot row, so editing or deleting a saved
//! address leaves order history untouched.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use canvas_gallery_core::{AddressId, UserId};

use crate::db::{RepositoryError, Store, UnitOfWork};
use crate::models::{Address, DeliveryAddress, User};
use crate::services::auth::{self, AuthError};

/// Optional `+`, no leading zero, 2 to 15 digits.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("Invalid regex"));

const NAME_LENGTH: std::ops::RangeInclusive<usize> = 2..=100;

/// Errors from account self-service.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("User not found")]
    UserNotFound,

    /// Also returned for another user's address.
    #[error("Address not found")]
    AddressNotFound,

    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Address is missing: {0}")]
    InvalidAddress(String),

    #[error("Current password is incorrect")]
    IncorrectPassword,

    #[error("{0}")]
    WeakPassword(String),

    #[error("password hashing error")]
    PasswordHash,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<AuthError> for UserError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::WeakPassword(msg) => Self::WeakPassword(msg),
            AuthError::InvalidCredentials => Self::IncorrectPassword,
            AuthError::Repository(err) => Self::Repository(err),
            _ => Self::PasswordHash,
        }
    }
}

/// A user with their saved addresses.
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub addresses: Vec<Address>,
}

/// Profile edit form. A missing or blank phone clears it.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileUpdate {
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

/// Address book entry as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct SavedAddressRequest {
    #[serde(flatten)]
    pub address: DeliveryAddress,
    /// Make this the default. `false` leaves the current default alone.
    #[serde(default)]
    pub is_default: bool,
}

impl ProfileUpdate {
    /// Trimmed name and phone, or the first problem found.
    fn validated(&self) -> Result<(&str, Option<&str>), UserError> {
        let name = self.name.trim();
        if !NAME_LENGTH.contains(&name.chars().count()) {
            return Err(UserError::InvalidProfile(
                "name must be between 2 and 100 characters".to_string(),
            ));
        }
        let phone = self
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty());
        if let Some(phone) = phone
            && !PHONE_RE.is_match(phone)
        {
            return Err(UserError::InvalidProfile(
                "invalid phone number format".to_string(),
            ));
        }
        Ok((name, phone))
    }
}

fn check_address(address: &DeliveryAddress) -> Result<(), UserError> {
    let missing = address.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(UserError::InvalidAddress(missing.join(", ")))
    }
}

/// A saved address that belongs to `user_id`.
async fn owned_address(
    uow: &mut dyn UnitOfWork,
    user_id: UserId,
    id: AddressId,
) -> Result<Address, UserError> {
    uow.find_saved_address(id)
        .await?
        .filter(|address| address.user_id == user_id)
        .ok_or(UserError::AddressNotFound)
}

/// Account operations over a [`Store`].
pub struct UserService<'a> {
    store: &'a dyn Store,
}

impl<'a> UserService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// `UserNotFound`.
    pub async fn profile(&self, user_id: UserId) -> Result<Profile, UserError> {
        let mut uow = self.store.begin().await?;
        let user = uow
            .find_user(user_id)
            .await?
            .ok_or(UserError::UserNotFound)?;
        let addresses = uow.saved_addresses(user_id).await?;
        Ok(Profile { user, addresses })
    }

    /// # Errors
    ///
    /// `InvalidProfile` or `UserNotFound`.
    #[instrument(skip(self, update), fields(user_id = %user_id))]
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, UserError> {
        let (name, phone) = update.validated()?;
        let mut uow = self.store.begin().await?;
        let user = uow
            .update_user_profile(user_id, name, phone)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => UserError::UserNotFound,
                other => UserError::Repository(other),
            })?;
        uow.commit().await?;
        tracing::info!("Profile updated");
        Ok(user)
    }

    /// Replace the password after checking the current one.
    ///
    /// # Errors
    ///
    /// `WeakPassword`, `IncorrectPassword` or `UserNotFound`.
    #[instrument(skip(self, change), fields(user_id = %user_id))]
    pub async fn change_password(
        &self,
        user_id: UserId,
        change: &PasswordChange,
    ) -> Result<(), UserError> {
        auth::validate_password(&change.new_password)?;

        let mut uow = self.store.begin().await?;
        let current = uow
            .password_hash(user_id)
            .await?
            .ok_or(UserError::UserNotFound)?;
        auth::verify_password(&change.current_password, &current)?;

        let hash = auth::hash_password(&change.new_password)?;
        uow.set_password_hash(user_id, &hash).await?;
        uow.commit().await?;
        tracing::info!("Password changed");
        Ok(())
    }

    /// Saved addresses in creation order.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn addresses(&self, user_id: UserId) -> Result<Vec<Address>, UserError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.saved_addresses(user_id).await?)
    }

    /// # Errors
    ///
    /// `InvalidAddress` when a field is blank.
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn add_address(
        &self,
        user_id: UserId,
        request: &SavedAddressRequest,
    ) -> Result<Address, UserError> {
        check_address(&request.address)?;
        let mut uow = self.store.begin().await?;
        let mut address = uow.insert_saved_address(user_id, &request.address).await?;
        if request.is_default {
            uow.set_default_address(user_id, address.id).await?;
            address.is_default = true;
        }
        uow.commit().await?;
        tracing::info!(address_id = %address.id, "Address saved");
        Ok(address)
    }

    /// Replace an address's fields.
    ///
    /// # Errors
    ///
    /// `InvalidAddress` or `AddressNotFound`.
    #[instrument(skip(self, request), fields(user_id = %user_id, address_id = %id))]
    pub async fn update_address(
        &self,
        user_id: UserId,
        id: AddressId,
        request: &SavedAddressRequest,
    ) -> Result<Address, UserError> {
        check_address(&request.address)?;
        let mut uow = self.store.begin().await?;
        owned_address(&mut *uow, user_id, id).await?;
        let mut address = uow.update_saved_address(id, &request.address).await?;
        if request.is_default && !address.is_default {
            uow.set_default_address(user_id, id).await?;
            address.is_default = true;
        }
        uow.commit().await?;
        tracing::info!("Address updated");
        Ok(address)
    }

    /// # Errors
    ///
    /// `AddressNotFound`.
    #[instrument(skip(self), fields(user_id = %user_id, address_id = %id))]
    pub async fn delete_address(&self, user_id: UserId, id: AddressId) -> Result<(), UserError> {
        let mut uow = self.store.begin().await?;
        owned_address(&mut *uow, user_id, id).await?;
        uow.delete_saved_address(id).await?;
        uow.commit().await?;
        tracing::info!("Address deleted");
        Ok(())
    }

    /// Make one address the default, clearing the flag on the others.
    ///
    /// # Errors
    ///
    /// `AddressNotFound`.
    #[instrument(skip(self), fields(user_id = %user_id, address_id = %id))]
    pub async fn set_default_address(
        &self,
        user_id: UserId,
        id: AddressId,
    ) -> Result<Address, UserError> {
        let mut uow = self.store.begin().await?;
        let address = owned_address(&mut *uow, user_id, id).await?;
        uow.set_default_address(user_id, id).await?;
        uow.commit().await?;
        Ok(Address {
            is_default: true,
            ..address
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn update(name: &str, phone: Option<&str>) -> ProfileUpdate {
        ProfileUpdate {
            name: name.to_string(),
            phone: phone.map(String::from),
        }
    }

    #[test]
    fn test_profile_name_length() {
        assert!(update("M", None).validated().is_err());
        assert!(update("  Meera  ", None).validated().is_ok());
        assert!(update(&"x".repeat(101), None).validated().is_err());
        assert_eq!(update(" Meera Nair ", None).validated().unwrap().0, "Meera Nair");
    }

    #[test]
    fn test_profile_phone_format() {
        assert_eq!(
            update("Meera", Some(" +919845012345 ")).validated().unwrap().1,
            Some("+919845012345")
        );
        assert_eq!(update("Meera", Some("  ")).validated().unwrap().1, None);
        assert!(update("Meera", Some("098450")).validated().is_err());
        assert!(update("Meera", Some("+91 98450 12345")).validated().is_err());
        assert!(update("Meera", Some("1234567890123456")).validated().is_err());
    }

    #[test]
    fn test_saved_address_request_is_flat() {
        let request: SavedAddressRequest = serde_json::from_value(serde_json::json!({
            "street": "12 MG Road",
            "city": "Bengaluru",
            "state": "Karnataka",
            "country": "India",
            "pincode": "560001",
            "is_default": true,
        }))
        .unwrap();
        assert!(request.is_default);
        assert_eq!(request.address.city, "Bengaluru");
    }
}
