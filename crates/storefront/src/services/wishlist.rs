//! Saved paintings.

use thiserror::Error;

use canvas_gallery_core::{PaintingId, UserId, WishlistItemId};

use crate::db::{RepositoryError, Store};
use crate::models::{WishlistEntry, WishlistView};

/// Errors from wishlist operations.
#[derive(Debug, Error)]
pub enum WishlistError {
    #[error("Painting not found")]
    PaintingNotFound,

    #[error("Painting is already in wishlist")]
    AlreadyExists,

    #[error("Wishlist item not found")]
    ItemNotFound,

    #[error("Wishlist item does not belong to user")]
    Forbidden,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Wishlist operations over a [`Store`].
pub struct WishlistService<'a> {
    store: &'a dyn Store,
}

impl<'a> WishlistService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's saved paintings, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn get(&self, user_id: UserId) -> Result<WishlistView, WishlistError> {
        let mut uow = self.store.begin().await?;
        let items = uow.wishlist_items(user_id).await?;

        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let painting = uow.find_painting(item.painting_id).await?.ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "wishlist item {} references missing painting {}",
                    item.id, item.painting_id
                ))
            })?;
            entries.push(WishlistEntry {
                id: item.id,
                added_at: item.added_at,
                painting,
            });
        }

        Ok(WishlistView {
            total_items: entries.len(),
            items: entries,
        })
    }

    /// Save a painting.
    ///
    /// # Errors
    ///
    /// `PaintingNotFound`, or `AlreadyExists` when it is already saved.
    pub async fn add(
        &self,
        user_id: UserId,
        painting_id: PaintingId,
    ) -> Result<WishlistEntry, WishlistError> {
        let mut uow = self.store.begin().await?;
        let painting = uow
            .find_painting(painting_id)
            .await?
            .ok_or(WishlistError::PaintingNotFound)?;
        if uow.find_wishlist_entry(user_id, painting_id).await?.is_some() {
            return Err(WishlistError::AlreadyExists);
        }

        let item = uow
            .insert_wishlist_item(user_id, painting_id)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => WishlistError::AlreadyExists,
                other => WishlistError::Repository(other),
            })?;
        uow.commit().await?;

        tracing::debug!(user_id = %user_id, painting_id = %painting_id, "Saved painting");
        Ok(WishlistEntry {
            id: item.id,
            added_at: item.added_at,
            painting,
        })
    }

    /// Remove one of the user's saved paintings.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` or `Forbidden`.
    pub async fn remove(&self, user_id: UserId, item_id: WishlistItemId) -> Result<(), WishlistError> {
        let mut uow = self.store.begin().await?;
        let item = uow
            .find_wishlist_item(item_id)
            .await?
            .ok_or(WishlistError::ItemNotFound)?;
        if item.user_id != user_id {
            return Err(WishlistError::Forbidden);
        }
        uow.delete_wishlist_item(item.id).await?;
        uow.commit().await?;
        Ok(())
    }

    /// Whether the user has saved this painting.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn contains(
        &self,
        user_id: UserId,
        painting_id: PaintingId,
    ) -> Result<bool, WishlistError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.find_wishlist_entry(user_id, painting_id).await?.is_some())
    }

    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn count(&self, user_id: UserId) -> Result<i64, WishlistError> {
        let mut uow = self.store.begin().await?;
        Ok(uow.count_wishlist(user_id).await?)
    }

    /// Remove everything the user saved; returns how many items went.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn clear(&self, user_id: UserId) -> Result<u64, WishlistError> {
        let mut uow = self.store.begin().await?;
        let removed = uow.clear_wishlist(user_id).await?;
        uow.commit().await?;
        Ok(removed)
    }
}
