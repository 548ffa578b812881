//! Public catalogue handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;

use canvas_gallery_core::PaintingId;

use crate::error::Result;
use crate::models::{Page, PageRequest, Painting, PaintingQuery, PaintingSort};
use crate::state::AppState;

/// Catalogue query string.
#[derive(Debug, Default, Deserialize)]
pub struct PaintingParams {
    pub q: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub available_only: Option<bool>,
    pub sort: Option<PaintingSort>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PaintingParams {
    /// Build a query, hiding unavailable paintings unless told otherwise.
    #[must_use]
    pub fn into_query(self, available_only_default: bool) -> PaintingQuery {
        PaintingQuery {
            text: self.q.filter(|q| !q.trim().is_empty()),
            min_price: self.min_price,
            max_price: self.max_price,
            available_only: self.available_only.unwrap_or(available_only_default),
            sort: self.sort.unwrap_or_default(),
            page: PageRequest::new(self.page, self.size),
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<PaintingParams>,
) -> Result<Json<Page<Painting>>> {
    let page = state.catalog().list(&params.into_query(true)).await?;
    Ok(Json(page))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<PaintingId>,
) -> Result<Json<Painting>> {
    Ok(Json(state.catalog().get(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_query_defaults() {
        let query = PaintingParams::default().into_query(true);
        assert!(query.available_only);
        assert_eq!(query.sort, PaintingSort::Newest);
        assert_eq!(query.page.page, 0);
        assert!(query.text.is_none());

        let admin = PaintingParams::default().into_query(false);
        assert!(!admin.available_only);
    }

    #[test]
    fn test_blank_text_ignored() {
        let params = PaintingParams {
            q: Some("   ".to_string()),
            ..PaintingParams::default()
        };
        assert!(params.into_query(true).text.is_none());
    }
}
