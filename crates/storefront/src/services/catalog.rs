//! Public catalogue browsing.

use thiserror::Error;

use canvas_gallery_core::PaintingId;

use crate::db::{RepositoryError, Store};
use crate::models::{Page, Painting, PaintingQuery};

/// Errors from catalogue reads.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Painting not found")]
    NotFound,

    #[error("min_price must not exceed max_price")]
    InvalidPriceRange,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// One page of paintings matching `query`.
    ///
    /// # Errors
    ///
    /// `InvalidPriceRange` when the bounds are crossed.
    pub async fn list(&self, query: &PaintingQuery) -> Result<Page<Painting>, CatalogError> {
        if let (Some(min), Some(max)) = (query.min_price, query.max_price)
            && min > max
        {
            return Err(CatalogError::InvalidPriceRange);
        }
        let mut uow = self.store.begin().await?;
        Ok(uow.search_paintings(query).await?)
    }

    /// A single painting. Counts as a view.
    ///
    /// # Errors
    ///
    /// `NotFound` if no painting has this id.
    pub async fn get(&self, id: PaintingId) -> Result<Painting, CatalogError> {
        let mut uow = self.store.begin().await?;
        let mut painting = uow.find_painting(id).await?.ok_or(CatalogError::NotFound)?;
        uow.increment_view_count(id).await?;
        uow.commit().await?;
        painting.view_count += 1;
        Ok(painting)
    }
}
