//! Order rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::types::{OrderId, OrderItemId, OrderStatus, PaymentMethod, ProductId, UserId};

/// A placed order.
///
/// Customer contact fields are copied at checkout so that later profile
/// edits do not rewrite order history.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Order {
    pub id: OrderId,
    pub code: String,
    pub user_id: Option<UserId>,
    pub customer_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: String,
    pub note: Option<String>,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub subtotal: Decimal,
    pub shipping_fee: Decimal,
    pub total: Decimal,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order, with the product name and slug as they were at
/// checkout.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub product_slug: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}
