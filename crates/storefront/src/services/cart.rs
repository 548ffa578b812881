//! Shopping cart operations.
//!
//! Every user gets one cart, created on first use. Quantities are checked
//! against stock when items are added or changed, and again at checkout.

use thiserror::Error;
use tracing::instrument;

use canvas_gallery_core::{CartItemId, PaintingId, UserId};

use crate::db::{RepositoryError, Store, UnitOfWork};
use crate::models::{Cart, CartItem, CartLine, CartView};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Painting not found")]
    PaintingNotFound,

    #[error("Painting is not available")]
    PaintingUnavailable,

    #[error("Insufficient stock. Available: {available}")]
    InsufficientStock { available: i32 },

    #[error("Quantity must be greater than 0")]
    InvalidQuantity,

    #[error("Cart item not found")]
    ItemNotFound,

    #[error("Cart item does not belong to user")]
    Forbidden,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Cart operations over a [`Store`].
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// The user's cart, created empty if they have none.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn get(&self, user_id: UserId) -> Result<CartView, CartError> {
        let mut uow = self.store.begin().await?;
        let cart = cart_for(&mut *uow, user_id).await?;
        let view = view(&mut *uow, &cart).await?;
        uow.commit().await?;
        Ok(view)
    }

    /// Add `quantity` units of a painting, merging with an existing line.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity`, `PaintingNotFound`, `PaintingUnavailable`, or
    /// `InsufficientStock` when stock cannot cover the merged quantity.
    #[instrument(skip(self), fields(user_id = %user_id, painting_id = %painting_id))]
    pub async fn add(
        &self,
        user_id: UserId,
        painting_id: PaintingId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut uow = self.store.begin().await?;
        let painting = uow
            .find_painting(painting_id)
            .await?
            .ok_or(CartError::PaintingNotFound)?;
        if !painting.is_available {
            return Err(CartError::PaintingUnavailable);
        }
        if painting.stock_quantity < quantity {
            return Err(CartError::InsufficientStock {
                available: painting.stock_quantity,
            });
        }

        let cart = cart_for(&mut *uow, user_id).await?;
        let existing = uow
            .cart_items(cart.id)
            .await?
            .into_iter()
            .find(|item| item.painting_id == painting_id);

        match existing {
            Some(item) => {
                let merged = item
                    .quantity
                    .checked_add(quantity)
                    .filter(|merged| *merged <= painting.stock_quantity)
                    .ok_or(CartError::InsufficientStock {
                        available: painting.stock_quantity,
                    })?;
                uow.set_cart_item_quantity(item.id, merged).await?;
            }
            None => {
                uow.insert_cart_item(cart.id, painting_id, quantity).await?;
            }
        }

        let view = view(&mut *uow, &cart).await?;
        uow.commit().await?;
        tracing::debug!(quantity, "Added painting to cart");
        Ok(view)
    }

    /// Set the quantity of one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// `InvalidQuantity`, `ItemNotFound`, `Forbidden`, or `InsufficientStock`.
    pub async fn update_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartView, CartError> {
        if quantity <= 0 {
            return Err(CartError::InvalidQuantity);
        }

        let mut uow = self.store.begin().await?;
        let (cart, item) = owned_item(&mut *uow, user_id, item_id).await?;
        let painting = uow
            .find_painting(item.painting_id)
            .await?
            .ok_or(CartError::PaintingNotFound)?;
        if painting.stock_quantity < quantity {
            return Err(CartError::InsufficientStock {
                available: painting.stock_quantity,
            });
        }

        uow.set_cart_item_quantity(item.id, quantity).await?;
        let view = view(&mut *uow, &cart).await?;
        uow.commit().await?;
        Ok(view)
    }

    /// Remove one of the user's cart lines.
    ///
    /// # Errors
    ///
    /// `ItemNotFound` or `Forbidden`.
    pub async fn remove_item(
        &self,
        user_id: UserId,
        item_id: CartItemId,
    ) -> Result<CartView, CartError> {
        let mut uow = self.store.begin().await?;
        let (cart, item) = owned_item(&mut *uow, user_id, item_id).await?;
        uow.delete_cart_item(item.id).await?;
        let view = view(&mut *uow, &cart).await?;
        uow.commit().await?;
        Ok(view)
    }

    /// Empty the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn clear(&self, user_id: UserId) -> Result<CartView, CartError> {
        let mut uow = self.store.begin().await?;
        let cart = cart_for(&mut *uow, user_id).await?;
        let removed = uow.clear_cart(cart.id).await?;
        uow.commit().await?;
        tracing::debug!(user_id = %user_id, removed, "Cleared cart");
        Ok(CartView::new(cart.id, Vec::new()))
    }
}

async fn cart_for(uow: &mut dyn UnitOfWork, user_id: UserId) -> Result<Cart, RepositoryError> {
    match uow.lock_cart(user_id).await? {
        Some(cart) => Ok(cart),
        None => uow.insert_cart(user_id).await,
    }
}

async fn owned_item(
    uow: &mut dyn UnitOfWork,
    user_id: UserId,
    item_id: CartItemId,
) -> Result<(Cart, CartItem), CartError> {
    let item = uow
        .find_cart_item(item_id)
        .await?
        .ok_or(CartError::ItemNotFound)?;
    let cart = uow.lock_cart(user_id).await?.ok_or(CartError::Forbidden)?;
    if item.cart_id != cart.id {
        return Err(CartError::Forbidden);
    }
    Ok((cart, item))
}

async fn view(uow: &mut dyn UnitOfWork, cart: &Cart) -> Result<CartView, RepositoryError> {
    let items = uow.cart_items(cart.id).await?;
    let mut lines = Vec::with_capacity(items.len());
    for item in &items {
        let painting = uow.find_painting(item.painting_id).await?.ok_or_else(|| {
            RepositoryError::DataCorruption(format!(
                "cart item {} references missing painting {}",
                item.id, item.painting_id
            ))
        })?;
        lines.push(CartLine::new(item, &painting));
    }
    Ok(CartView::new(cart.id, lines))
}
