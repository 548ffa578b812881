//! Human-facing order numbers.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An order number such as `TC20240315143005`.
///
/// Numbers are `TC` followed by the placement time formatted
/// `yyyyMMddHHmmss`. Two orders placed within the same second would collide,
/// so a numeric suffix can be appended with [`OrderNumber::with_suffix`]. The
/// unique index on `orders.order_number` remains the final guard.
///
/// ```
/// use canvas_gallery_core::OrderNumber;
/// use chrono::{TimeZone, Utc};
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 5).unwrap();
/// assert_eq!(OrderNumber::generate(at).as_str(), "TC20240315143005");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Prefix shared by every order number.
    pub const PREFIX: &'static str = "TC";

    /// Build the order number for an order placed at `at`.
    #[must_use]
    pub fn generate(at: DateTime<Utc>) -> Self {
        Self(format!("{}{}", Self::PREFIX, at.format("%Y%m%d%H%M%S")))
    }

    /// Disambiguate a colliding number by appending `-<suffix>`.
    #[must_use]
    pub fn with_suffix(&self, suffix: u16) -> Self {
        Self(format!("{}-{suffix:04}", self.0))
    }

    /// Wrap a number read back from storage.
    #[must_use]
    pub const fn from_stored(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for OrderNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for OrderNumber {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for OrderNumber {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        Ok(Self(<String as sqlx::Decode<sqlx::Postgres>>::decode(value)?))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for OrderNumber {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
