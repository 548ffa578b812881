//! Delivery addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use canvas_gallery_core::{AddressId, UserId};

/// A stored address row.
///
/// Rows come in two kinds. Saved addresses (`is_saved`) belong to the
/// customer's address book and may be edited or deleted. Checkout copies the
/// submitted address into a fresh unsaved row every time, so an order keeps
/// pointing at exactly what the buyer typed even after the address book
/// changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
    pub is_default: bool,
    #[serde(skip_serializing)]
    pub is_saved: bool,
    pub created_at: DateTime<Utc>,
}

impl Address {
    /// The address fields without row metadata.
    #[must_use]
    pub fn fields(&self) -> DeliveryAddress {
        DeliveryAddress {
            street: self.street.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            country: self.country.clone(),
            pincode: self.pincode.clone(),
        }
    }
}

/// Address fields as submitted at checkout or to the address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub pincode: String,
}

impl DeliveryAddress {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("street", &self.street),
            ("city", &self.city),
            ("state", &self.state),
            ("country", &self.country),
            ("pincode", &self.pincode),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}
