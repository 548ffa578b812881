//! Back-office operations: dashboard figures and catalogue maintenance.
//!
//! Order status changes live in [`crate::services::orders::OrderService`]
//! so that admin cancellations share the buyer cancellation path.

use chrono::{DateTime, Datelike, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use canvas_gallery_core::{CurrencyCode, PaintingId};

use crate::db::{RepositoryError, Store};
use crate::models::{
    MonthlyRevenue, OrderStats, Page, Painting, PaintingDraft, PaintingQuery, PaintingRank,
    PaintingStats, PopularPainting,
};

/// Length of each top-painting list on the dashboard.
const TOP_PAINTINGS: i64 = 5;

/// Months covered by the revenue trend.
const TREND_MONTHS: i64 = 12;

/// Prices must fit `NUMERIC(12, 2)`.
const PRICE_SCALE: u32 = 2;
const PRICE_LIMIT: i64 = 10_000_000_000;

/// Errors from admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Painting not found")]
    PaintingNotFound,

    #[error("Invalid painting: {0}")]
    InvalidPainting(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Figures shown on the admin dashboard.
///
/// Month and year boundaries are calendar boundaries in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_users: i64,
    pub new_users_this_month: i64,
    #[serde(flatten)]
    pub orders: OrderStats,
    pub revenue_this_month: Decimal,
    pub revenue_this_year: Decimal,
    #[serde(flatten)]
    pub paintings: PaintingStats,
    pub most_viewed_paintings: Vec<PopularPainting>,
    pub best_selling_paintings: Vec<PopularPainting>,
    /// Newest month first.
    pub monthly_revenue_trend: Vec<MonthlyRevenue>,
    pub currency: CurrencyCode,
}

/// Midnight on the first day of `now`'s month.
fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_day(1)
        .unwrap_or_else(|| now.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Midnight on the first day of `now`'s year.
fn year_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .with_ordinal(1)
        .unwrap_or_else(|| now.date_naive())
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// Reject drafts the schema would refuse.
///
/// # Errors
///
/// Returns `InvalidPainting` naming the first problem.
pub fn validate_draft(draft: &PaintingDraft) -> Result<(), AdminError> {
    if draft.title.trim().is_empty() {
        return Err(AdminError::InvalidPainting("title is required".to_string()));
    }
    if draft.artist_name.trim().is_empty() {
        return Err(AdminError::InvalidPainting(
            "artist name is required".to_string(),
        ));
    }
    if draft.price <= Decimal::ZERO {
        return Err(AdminError::InvalidPainting(
            "price must be greater than 0".to_string(),
        ));
    }
    if draft.price.normalize().scale() > PRICE_SCALE {
        return Err(AdminError::InvalidPainting(
            "price cannot have more than 2 decimal places".to_string(),
        ));
    }
    if draft.price >= Decimal::from(PRICE_LIMIT) {
        return Err(AdminError::InvalidPainting(
            "price must be less than 10000000000".to_string(),
        ));
    }
    if draft.stock_quantity < 0 {
        return Err(AdminError::InvalidPainting(
            "stock quantity cannot be negative".to_string(),
        ));
    }
    Ok(())
}

/// A draft whose availability respects its stock.
fn normalized(draft: &PaintingDraft) -> PaintingDraft {
    PaintingDraft {
        is_available: draft.is_available && draft.stock_quantity > 0,
        ..draft.clone()
    }
}

pub struct AdminService<'a> {
    store: &'a dyn Store,
}

impl<'a> AdminService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, AdminError> {
        let now = Utc::now();
        let (this_month, this_year) = (month_start(now), year_start(now));

        let mut uow = self.store.begin().await?;
        let most_viewed = uow
            .top_paintings(PaintingRank::MostViewed, TOP_PAINTINGS)
            .await?;
        let best_selling = uow
            .top_paintings(PaintingRank::BestSelling, TOP_PAINTINGS)
            .await?;
        Ok(DashboardStats {
            total_users: uow.count_users().await?,
            new_users_this_month: uow.count_users_since(this_month).await?,
            orders: uow.order_stats().await?,
            revenue_this_month: uow.revenue_since(this_month).await?,
            revenue_this_year: uow.revenue_since(this_year).await?,
            paintings: uow.painting_stats().await?,
            most_viewed_paintings: most_viewed.iter().map(PopularPainting::from).collect(),
            best_selling_paintings: best_selling.iter().map(PopularPainting::from).collect(),
            monthly_revenue_trend: uow.monthly_revenue(TREND_MONTHS).await?,
            currency: CurrencyCode::INR,
        })
    }

    /// Catalogue listing including withdrawn and sold-out paintings unless
    /// the query asks otherwise.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn list_paintings(&self, query: &PaintingQuery) -> Result<Page<Painting>, AdminError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.search_paintings(query).await?)
    }

    /// # Errors
    ///
    /// `InvalidPainting` when the draft is rejected.
    #[instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn create_painting(&self, draft: &PaintingDraft) -> Result<Painting, AdminError> {
        validate_draft(draft)?;
        let mut uow = self.store.begin().await?;
        let painting = uow.insert_painting(&normalized(draft)).await?;
        uow.commit().await?;
        tracing::info!(painting_id = %painting.id, "Painting created");
        Ok(painting)
    }

    /// Replace a painting's details. A stock of zero always withdraws it.
    ///
    /// # Errors
    ///
    /// `InvalidPainting` or `PaintingNotFound`.
    #[instrument(skip(self, draft), fields(painting_id = %id))]
    pub async fn update_painting(
        &self,
        id: PaintingId,
        draft: &PaintingDraft,
    ) -> Result<Painting, AdminError> {
        validate_draft(draft)?;
        let mut uow = self.store.begin().await?;
        if uow.lock_paintings(&[id]).await?.is_empty() {
            return Err(AdminError::PaintingNotFound);
        }
        let painting = uow.update_painting(id, &normalized(draft)).await?;
        uow.commit().await?;
        tracing::info!(stock = painting.stock_quantity, "Painting updated");
        Ok(painting)
    }

    /// Withdraw a painting from sale. Its rows stay for order history.
    ///
    /// # Errors
    ///
    /// `PaintingNotFound`.
    #[instrument(skip(self), fields(painting_id = %id))]
    pub async fn delete_painting(&self, id: PaintingId) -> Result<(), AdminError> {
        let mut uow = self.store.begin().await?;
        if uow.lock_paintings(&[id]).await?.is_empty() {
            return Err(AdminError::PaintingNotFound);
        }
        uow.set_painting_available(id, false).await?;
        uow.commit().await?;
        tracing::info!("Painting withdrawn");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn draft() -> PaintingDraft {
        PaintingDraft {
            title: "Backwaters at Dusk".to_string(),
            artist_name: "A. Menon".to_string(),
            description: None,
            medium: None,
            height_cm: None,
            width_cm: None,
            depth_cm: None,
            year_created: None,
            price: Decimal::new(250_000, 2),
            stock_quantity: 1,
            is_available: true,
        }
    }

    #[test]
    fn test_validate_draft() {
        assert!(validate_draft(&draft()).is_ok());

        let mut bad = draft();
        bad.title = "  ".to_string();
        assert!(matches!(
            validate_draft(&bad),
            Err(AdminError::InvalidPainting(_))
        ));

        let mut bad = draft();
        bad.price = Decimal::ZERO;
        assert!(validate_draft(&bad).is_err());

        let mut bad = draft();
        bad.stock_quantity = -1;
        assert!(validate_draft(&bad).is_err());
    }

    #[test]
    fn test_validate_draft_price_fits_column() {
        let priced = |price: Decimal| PaintingDraft { price, ..draft() };

        assert!(validate_draft(&priced(Decimal::new(1_005, 3))).is_err());
        assert!(validate_draft(&priced(Decimal::new(1_010, 3))).is_ok());
        assert!(validate_draft(&priced(Decimal::new(999_999_999_999, 2))).is_ok());
        assert!(matches!(
            validate_draft(&priced(Decimal::from(PRICE_LIMIT))),
            Err(AdminError::InvalidPainting(_))
        ));
    }

    #[test]
    fn test_period_starts() {
        use chrono::TimeZone;

        let now = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 5).unwrap();
        assert_eq!(
            month_start(now),
            Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            year_start(now),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_zero_stock_forces_unavailable() {
        let mut sold_out = draft();
        sold_out.stock_quantity = 0;
        assert!(!normalized(&sold_out).is_available);

        let mut withdrawn = draft();
        withdrawn.is_available = false;
        assert!(!normalized(&withdrawn).is_available);

        assert!(normalized(&draft()).is_available);
    }

    #[test]
    fn test_dashboard_stats_serializes_flat() {
        let stats = DashboardStats {
            total_users: 3,
            new_users_this_month: 1,
            orders: OrderStats::default(),
            revenue_this_month: Decimal::ZERO,
            revenue_this_year: Decimal::new(150_000, 2),
            paintings: PaintingStats::default(),
            most_viewed_paintings: Vec::new(),
            best_selling_paintings: Vec::new(),
            monthly_revenue_trend: vec![MonthlyRevenue::new(
                2025,
                3,
                Decimal::new(150_000, 2),
                1,
            )],
            currency: CurrencyCode::INR,
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["total_users"], 3);
        assert_eq!(json["new_users_this_month"], 1);
        assert_eq!(json["pending_orders"], 0);
        assert_eq!(json["available_paintings"], 0);
        assert_eq!(json["revenue_this_year"], "1500.00");
        assert_eq!(json["monthly_revenue_trend"][0]["month_name"], "MARCH");
        assert_eq!(json["currency"], "INR");
    }
}
