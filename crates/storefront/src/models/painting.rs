//! Catalogue types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use canvas_gallery_core::{CurrencyCode, PaintingId};

use super::PageRequest;

/// A painting offered by the gallery.
///
/// `is_available` is false whenever `stock_quantity` is zero. It can also be
/// false with stock left when an admin withdraws the painting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Painting {
    pub id: PaintingId,
    pub title: String,
    pub artist_name: String,
    pub description: Option<String>,
    pub medium: Option<String>,
    pub height_cm: Option<Decimal>,
    pub width_cm: Option<Decimal>,
    pub depth_cm: Option<Decimal>,
    pub year_created: Option<i32>,
    pub price: Decimal,
    pub currency: CurrencyCode,
    pub stock_quantity: i32,
    pub is_available: bool,
    pub view_count: i64,
    pub purchase_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable painting fields, used for both create and update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaintingDraft {
    pub title: String,
    pub artist_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub medium: Option<String>,
    #[serde(default)]
    pub height_cm: Option<Decimal>,
    #[serde(default)]
    pub width_cm: Option<Decimal>,
    #[serde(default)]
    pub depth_cm: Option<Decimal>,
    #[serde(default)]
    pub year_created: Option<i32>,
    pub price: Decimal,
    pub stock_quantity: i32,
    #[serde(default = "default_true")]
    pub is_available: bool,
}

const fn default_true() -> bool {
    true
}

/// Ordering of catalogue listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaintingSort {
    /// Most recently added first.
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    /// Most purchased first.
    Popular,
}

/// Catalogue filter.
#[derive(Debug, Clone, Default)]
pub struct PaintingQuery {
    /// Case-insensitive substring of title or artist.
    pub text: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Hide withdrawn and sold-out paintings.
    pub available_only: bool,
    pub sort: PaintingSort,
    pub page: PageRequest,
}

impl PaintingQuery {
    /// Whether `painting` passes the filters (ignores paging and sort).
    #[must_use]
    pub fn matches(&self, painting: &Painting) -> bool {
        if self.available_only && !painting.is_available {
            return false;
        }
        if self.min_price.is_some_and(|min| painting.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| painting.price > max) {
            return false;
        }
        match self.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => {
                let needle = text.to_lowercase();
                painting.title.to_lowercase().contains(&needle)
                    || painting.artist_name.to_lowercase().contains(&needle)
            }
            _ => true,
        }
    }
}

/// Catalogue counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PaintingStats {
    pub total_paintings: i64,
    pub available_paintings: i64,
    /// Paintings not on sale: sold out or withdrawn.
    pub out_of_stock_paintings: i64,
}

impl PaintingStats {
    #[must_use]
    pub const fn new(total_paintings: i64, available_paintings: i64) -> Self {
        Self {
            total_paintings,
            available_paintings,
            out_of_stock_paintings: total_paintings - available_paintings,
        }
    }
}

/// Ordering of the dashboard's top-painting lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaintingRank {
    MostViewed,
    BestSelling,
}

impl PaintingRank {
    /// The counter a painting is ranked by.
    #[must_use]
    pub const fn score(self, painting: &Painting) -> i64 {
        match self {
            Self::MostViewed => painting.view_count,
            Self::BestSelling => painting.purchase_count,
        }
    }
}

/// A painting as listed in a dashboard ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PopularPainting {
    pub painting_id: PaintingId,
    pub title: String,
    pub artist_name: String,
    pub price: Decimal,
    pub view_count: i64,
    pub purchase_count: i64,
}

impl From<&Painting> for PopularPainting {
    fn from(painting: &Painting) -> Self {
        Self {
            painting_id: painting.id,
            title: painting.title.clone(),
            artist_name: painting.artist_name.clone(),
            price: painting.price,
            view_count: painting.view_count,
            purchase_count: painting.purchase_count,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn painting(title: &str, artist: &str, price: &str, available: bool) -> Painting {
        Painting {
            id: PaintingId::new(1),
            title: title.to_owned(),
            artist_name: artist.to_owned(),
            description: None,
            medium: None,
            height_cm: None,
            width_cm: None,
            depth_cm: None,
            year_created: None,
            price: Decimal::from_str(price).unwrap(),
            currency: CurrencyCode::INR,
            stock_quantity: i32::from(available),
            is_available: available,
            view_count: 0,
            purchase_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_text_matches_title_or_artist() {
        let query = PaintingQuery {
            text: Some("MONSOON".to_owned()),
            ..PaintingQuery::default()
        };
        assert!(query.matches(&painting("Monsoon Ghats", "R. Iyer", "100.00", true)));
        assert!(!query.matches(&painting("Harbour", "R. Iyer", "100.00", true)));

        let by_artist = PaintingQuery {
            text: Some("iyer".to_owned()),
            ..PaintingQuery::default()
        };
        assert!(by_artist.matches(&painting("Harbour", "R. Iyer", "100.00", true)));
    }

    #[test]
    fn test_price_bounds_are_inclusive() {
        let query = PaintingQuery {
            min_price: Some(Decimal::from(100)),
            max_price: Some(Decimal::from(200)),
            ..PaintingQuery::default()
        };
        assert!(query.matches(&painting("A", "B", "100.00", true)));
        assert!(query.matches(&painting("A", "B", "200.00", true)));
        assert!(!query.matches(&painting("A", "B", "200.01", true)));
    }

    #[test]
    fn test_available_only_hides_withdrawn() {
        let query = PaintingQuery {
            available_only: true,
            ..PaintingQuery::default()
        };
        assert!(!query.matches(&painting("A", "B", "10.00", false)));
        assert!(query.matches(&painting("A", "B", "10.00", true)));
    }

    #[test]
    fn test_rank_and_popular_view() {
        let mut painting = painting("Monsoon Ghats", "R. Iyer", "1500.00", true);
        painting.view_count = 40;
        painting.purchase_count = 3;
        assert_eq!(PaintingRank::MostViewed.score(&painting), 40);
        assert_eq!(PaintingRank::BestSelling.score(&painting), 3);

        let popular = PopularPainting::from(&painting);
        assert_eq!(popular.title, "Monsoon Ghats");
        assert_eq!(popular.purchase_count, 3);
    }

    #[test]
    fn test_out_of_stock_counts_everything_not_on_sale() {
        let stats = PaintingStats::new(5, 2);
        assert_eq!(stats.out_of_stock_paintings, 3);
    }
}
