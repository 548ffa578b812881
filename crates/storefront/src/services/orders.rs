//! Order placement, cancellation and lookup.
//!
//! Checkout locks the buyer's cart and then every painting in it, in
//! ascending id order, before checking availability and stock. All lines are
//! validated before anything is written, so a rejected checkout leaves the
//! store untouched. Stock changes, the order rows and the cart clearing
//! commit together.

use std::collections::HashMap;

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use canvas_gallery_core::{
    CurrencyCode, OrderId, OrderNumber, OrderStatus, PaintingId, PaymentMethod, UserId, line_total,
};

use crate::db::{RepositoryError, Store, UnitOfWork};
use crate::models::{
    AdminContact, CartItem, CheckoutRequest, NewOrder, NewOrderItem, Order, OrderDetails, Page,
    PageRequest, Painting, User,
};
use crate::services::notify::{OrderConfirmation, Notifier};

/// How many suffixed order numbers to try after a collision.
const ORDER_NUMBER_ATTEMPTS: usize = 8;

/// Errors from the order workflow.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("User not found")]
    UserNotFound,

    #[error("Order not found")]
    OrderNotFound,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Painting '{title}' is no longer available")]
    PaintingUnavailable { title: String },

    #[error("Insufficient stock for '{title}'. Available: {available}")]
    InsufficientStock { title: String, available: i32 },

    #[error("Delivery address is missing: {0}")]
    InvalidAddress(String),

    #[error("Order does not belong to user")]
    Forbidden,

    #[error("Order cannot be cancelled")]
    InvalidState,

    #[error("Cannot change order status from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Check that a painting can cover `quantity` units right now.
///
/// # Errors
///
/// Returns `PaintingUnavailable` before `InsufficientStock`.
pub fn check_line(painting: &Painting, quantity: i32) -> Result<(), OrderError> {
    if !painting.is_available {
        return Err(OrderError::PaintingUnavailable {
            title: painting.title.clone(),
        });
    }
    if painting.stock_quantity < quantity {
        return Err(OrderError::InsufficientStock {
            title: painting.title.clone(),
            available: painting.stock_quantity,
        });
    }
    Ok(())
}

/// Order workflow over a [`Store`].
pub struct OrderService<'a> {
    store: &'a dyn Store,
    notifier: &'a dyn Notifier,
    admin_contact: &'a AdminContact,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(
        store: &'a dyn Store,
        notifier: &'a dyn Notifier,
        admin_contact: &'a AdminContact,
    ) -> Self {
        Self {
            store,
            notifier,
            admin_contact,
        }
    }

    /// Turn the user's cart into a pending cash-on-delivery order.
    ///
    /// # Errors
    ///
    /// - `InvalidAddress` if a delivery address field is blank
    /// - `UserNotFound` if the user does not exist
    /// - `EmptyCart` if the user has no cart or it has no items
    /// - `PaintingUnavailable` / `InsufficientStock` for the first failing line,
    ///   in cart order
    /// - `Repository` if the store fails; nothing is committed
    #[instrument(skip(self, request), fields(user_id = %user_id))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        request: &CheckoutRequest,
    ) -> Result<OrderDetails, OrderError> {
        let missing = request.delivery_address.missing_fields();
        if !missing.is_empty() {
            return Err(OrderError::InvalidAddress(missing.join(", ")));
        }

        let mut uow = self.store.begin().await?;

        let user = uow
            .find_user(user_id)
            .await?
            .ok_or(OrderError::UserNotFound)?;
        let cart = uow.lock_cart(user_id).await?.ok_or(OrderError::EmptyCart)?;
        let items = uow.cart_items(cart.id).await?;
        if items.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let ids: Vec<PaintingId> = items.iter().map(|item| item.painting_id).collect();
        let paintings: HashMap<PaintingId, Painting> = uow
            .lock_paintings(&ids)
            .await?
            .into_iter()
            .map(|painting| (painting.id, painting))
            .collect();

        let mut lines: Vec<(&CartItem, &Painting)> = Vec::with_capacity(items.len());
        for item in &items {
            let painting = paintings.get(&item.painting_id).ok_or_else(|| {
                RepositoryError::DataCorruption(format!(
                    "cart item {} references missing painting {}",
                    item.id, item.painting_id
                ))
            })?;
            check_line(painting, item.quantity)?;
            lines.push((item, painting));
        }

        let address = uow.insert_address(user_id, &request.delivery_address).await?;
        let total_amount: Decimal = lines
            .iter()
            .map(|(item, painting)| line_total(painting.price, item.quantity))
            .sum();
        let order_number = next_order_number(&mut *uow).await?;

        let new_items: Vec<NewOrderItem> = lines
            .iter()
            .map(|(item, painting)| NewOrderItem {
                painting_id: painting.id,
                quantity: item.quantity,
                price_at_purchase: painting.price,
                painting_title: painting.title.clone(),
                artist_name: painting.artist_name.clone(),
            })
            .collect();
        let new_order = NewOrder {
            order_number,
            user_id,
            total_amount,
            currency: CurrencyCode::INR,
            delivery_address_id: address.id,
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::CashOnDelivery,
            notes: request.notes.clone(),
        };
        let order = uow.insert_order(&new_order, &new_items).await?;

        for (item, painting) in &lines {
            uow.record_sale(painting.id, item.quantity).await?;
        }
        uow.clear_cart(cart.id).await?;
        uow.commit().await?;

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total_amount = %order.total_amount,
            items = order.items.len(),
            "Order placed"
        );

        self.notify(&user, &order).await;

        Ok(OrderDetails::new(order, self.admin_contact.clone()))
    }

    /// Cancel one of the caller's orders and put its items back in stock.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, then `Forbidden` when the caller does not own it,
    /// then `InvalidState` when it is already delivered or cancelled.
    #[instrument(skip(self), fields(user_id = %user_id, order_id = %order_id))]
    pub async fn cancel(
        &self,
        user_id: UserId,
        order_id: OrderId,
    ) -> Result<OrderDetails, OrderError> {
        let mut uow = self.store.begin().await?;

        let order = uow
            .lock_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(OrderError::Forbidden);
        }

        let order = cancel_locked(&mut *uow, &order, None).await?;
        uow.commit().await?;

        tracing::info!(order_number = %order.order_number, "Order cancelled");
        Ok(OrderDetails::new(order, self.admin_contact.clone()))
    }

    /// One of the caller's orders.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, or `Forbidden` when the caller does not own it.
    pub async fn get(&self, user_id: UserId, order_id: OrderId) -> Result<OrderDetails, OrderError> {
        let mut uow = self.store.begin().await?;
        let order = uow
            .find_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;
        if order.user_id != user_id {
            return Err(OrderError::Forbidden);
        }
        Ok(OrderDetails::new(order, self.admin_contact.clone()))
    }

    /// The caller's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn list(
        &self,
        user_id: UserId,
        page: PageRequest,
    ) -> Result<Page<OrderDetails>, OrderError> {
        let mut uow = self.store.begin().await?;
        let orders = uow.list_user_orders(user_id, page).await?;
        Ok(orders.map(|order| OrderDetails::new(order, self.admin_contact.clone())))
    }

    /// Every order, newest first, optionally only those in `status`.
    ///
    /// # Errors
    ///
    /// Returns `Repository` if the store fails.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
        page: PageRequest,
    ) -> Result<Page<OrderDetails>, OrderError> {
        let mut uow = self.store.begin().await?;
        let orders = uow.list_orders(status, page).await?;
        Ok(orders.map(|order| OrderDetails::new(order, self.admin_contact.clone())))
    }

    /// Move an order along its lifecycle on behalf of an admin.
    ///
    /// Fulfilment only moves forward. Cancelling restocks like a buyer
    /// cancellation. Re-applying the current status only updates tracking.
    ///
    /// # Errors
    ///
    /// `OrderNotFound`, `InvalidTransition` for a backwards or terminal move.
    #[instrument(skip(self, tracking_info), fields(order_id = %order_id, status = %status))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
        tracking_info: Option<&str>,
    ) -> Result<OrderDetails, OrderError> {
        let mut uow = self.store.begin().await?;

        let order = uow
            .lock_order(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound)?;

        let updated = if status == OrderStatus::Cancelled && order.status.can_cancel() {
            cancel_locked(&mut *uow, &order, tracking_info).await?
        } else if status == order.status || order.status.can_transition_to(status) {
            uow.update_order_status(order.id, status, tracking_info)
                .await?;
            uow.find_order(order.id)
                .await?
                .ok_or(OrderError::OrderNotFound)?
        } else {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to: status,
            });
        };
        uow.commit().await?;

        tracing::info!(
            order_number = %updated.order_number,
            from = %order.status,
            to = %updated.status,
            "Order status updated"
        );
        Ok(OrderDetails::new(updated, self.admin_contact.clone()))
    }

    async fn notify(&self, user: &User, order: &Order) {
        let confirmation = OrderConfirmation::new(user, order);
        if let Err(error) = self.notifier.order_placed(&confirmation).await {
            tracing::warn!(
                error = %error,
                order_number = %order.order_number,
                "Failed to send order confirmation"
            );
        }
    }
}

/// Cancel an order whose row is already locked by `uow`.
async fn cancel_locked(
    uow: &mut dyn UnitOfWork,
    order: &Order,
    tracking_info: Option<&str>,
) -> Result<Order, OrderError> {
    if !order.status.can_cancel() {
        return Err(OrderError::InvalidState);
    }

    let ids: Vec<PaintingId> = order.items.iter().map(|item| item.painting_id).collect();
    uow.lock_paintings(&ids).await?;
    for item in &order.items {
        uow.restock(item.painting_id, item.quantity).await?;
    }
    uow.update_order_status(order.id, OrderStatus::Cancelled, tracking_info)
        .await?;

    uow.find_order(order.id)
        .await?
        .ok_or(OrderError::OrderNotFound)
}

/// An order number for this second that no stored order uses yet.
async fn next_order_number(uow: &mut dyn UnitOfWork) -> Result<OrderNumber, OrderError> {
    let base = OrderNumber::generate(Utc::now());
    if !uow.order_number_exists(&base).await? {
        return Ok(base);
    }
    for _ in 0..ORDER_NUMBER_ATTEMPTS {
        let suffix: u16 = rand::rng().random_range(0..10_000);
        let candidate = base.with_suffix(suffix);
        if !uow.order_number_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Err(RepositoryError::Conflict(format!("no free order number for {base}")).into())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn painting(stock: i32, available: bool) -> Painting {
        let now = Utc::now();
        Painting {
            id: PaintingId::new(1),
            title: "Monsoon Ghats".to_string(),
            artist_name: "R. Iyer".to_string(),
            description: None,
            medium: Some("Oil on canvas".to_string()),
            height_cm: None,
            width_cm: None,
            depth_cm: None,
            year_created: Some(2021),
            price: Decimal::new(150_000, 2),
            currency: CurrencyCode::INR,
            stock_quantity: stock,
            is_available: available,
            view_count: 0,
            purchase_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_check_line_accepts_exact_stock() {
        assert!(check_line(&painting(2, true), 2).is_ok());
    }

    #[test]
    fn test_check_line_unavailable_wins_over_stock() {
        let err = check_line(&painting(0, false), 1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Painting 'Monsoon Ghats' is no longer available"
        );
    }

    #[test]
    fn test_check_line_insufficient_stock() {
        let err = check_line(&painting(2, true), 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Insufficient stock for 'Monsoon Ghats'. Available: 2"
        );
    }

    #[test]
    fn test_transition_error_message() {
        let err = OrderError::InvalidTransition {
            from: OrderStatus::Shipped,
            to: OrderStatus::Pending,
        };
        assert_eq!(
            err.to_string(),
            "Cannot change order status from SHIPPED to PENDING"
        );
    }
}
