//! Order types.

use chrono::{DateTime, Month, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use canvas_gallery_core::{
    AddressId, CurrencyCode, OrderId, OrderItemId, OrderNumber, OrderStatus, PaintingId,
    PaymentMethod, UserId, line_total,
};

use super::{Address, DeliveryAddress};

/// A placed order with its items and delivery address.
///
/// Only `status`, `tracking_info` and `updated_at` change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub delivery_address: Address,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub tracking_info: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// A purchased painting, frozen at the moment of checkout.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub painting_id: PaintingId,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
    pub painting_title: String,
    pub artist_name: String,
}

impl OrderItem {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        line_total(self.price_at_purchase, self.quantity)
    }
}

/// Order header to insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub delivery_address_id: AddressId,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

/// Order line to insert.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub painting_id: PaintingId,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
    pub painting_title: String,
    pub artist_name: String,
}

/// Checkout request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub delivery_address: DeliveryAddress,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Who buyers should contact about an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminContact {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// An order line as shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItemView {
    pub painting_id: PaintingId,
    pub painting_title: String,
    pub artist_name: String,
    pub quantity: i32,
    pub price_at_purchase: Decimal,
    pub subtotal: Decimal,
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        Self {
            painting_id: item.painting_id,
            painting_title: item.painting_title.clone(),
            artist_name: item.artist_name.clone(),
            quantity: item.quantity,
            price_at_purchase: item.price_at_purchase,
            subtotal: item.subtotal(),
        }
    }
}

/// An order as returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub items: Vec<OrderItemView>,
    pub total_amount: Decimal,
    pub currency: CurrencyCode,
    pub delivery_address: Address,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub tracking_info: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub admin_contact: AdminContact,
}

impl OrderDetails {
    #[must_use]
    pub fn new(order: Order, admin_contact: AdminContact) -> Self {
        Self {
            id: order.id,
            items: order.items.iter().map(OrderItemView::from).collect(),
            order_number: order.order_number,
            total_amount: order.total_amount,
            currency: order.currency,
            delivery_address: order.delivery_address,
            status: order.status,
            payment_method: order.payment_method,
            tracking_info: order.tracking_info,
            notes: order.notes,
            created_at: order.created_at,
            updated_at: order.updated_at,
            admin_contact,
        }
    }
}

/// Revenue from orders that were not cancelled, for one calendar month
/// in UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyRevenue {
    pub year: i32,
    /// 1 through 12.
    pub month: u32,
    /// Upper-case English month name, e.g. `MARCH`.
    pub month_name: String,
    pub revenue: Decimal,
    pub order_count: i64,
}

impl MonthlyRevenue {
    #[must_use]
    pub fn new(year: i32, month: u32, revenue: Decimal, order_count: i64) -> Self {
        let month_name = u8::try_from(month)
            .ok()
            .and_then(|month| Month::try_from(month).ok())
            .map(|month| month.name().to_uppercase())
            .unwrap_or_default();
        Self {
            year,
            month,
            month_name,
            revenue,
            order_count,
        }
    }
}

/// Order counts and revenue for the admin dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderStats {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub confirmed_orders: i64,
    pub shipped_orders: i64,
    pub delivered_orders: i64,
    pub cancelled_orders: i64,
    /// Sum of totals over orders that were not cancelled.
    pub total_revenue: Decimal,
}

impl OrderStats {
    /// Add `count` orders in `status` whose totals sum to `total`.
    pub fn record(&mut self, status: OrderStatus, total: Decimal, count: i64) {
        self.total_orders += count;
        match status {
            OrderStatus::Pending => self.pending_orders += count,
            OrderStatus::Confirmed => self.confirmed_orders += count,
            OrderStatus::Shipped => self.shipped_orders += count,
            OrderStatus::Delivered => self.delivered_orders += count,
            OrderStatus::Cancelled => self.cancelled_orders += count,
        }
        if status != OrderStatus::Cancelled {
            self.total_revenue += total;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_revenue_names_the_month() {
        let march = MonthlyRevenue::new(2025, 3, Decimal::new(275_050, 2), 1);
        assert_eq!(march.month_name, "MARCH");
        assert_eq!(MonthlyRevenue::new(2025, 12, Decimal::ZERO, 0).month_name, "DECEMBER");
    }

    #[test]
    fn test_stats_leave_cancelled_orders_out_of_revenue() {
        let mut stats = OrderStats::default();
        stats.record(OrderStatus::Shipped, Decimal::new(100, 0), 2);
        stats.record(OrderStatus::Cancelled, Decimal::new(50, 0), 1);
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.cancelled_orders, 1);
        assert_eq!(stats.total_revenue, Decimal::new(100, 0));
    }
}
