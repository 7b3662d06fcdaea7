//! Orders, refunds and carts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use emporium_core::{
    CartId, OrderId, OrderItemId, OrderStatus, ProductId, RefundId, RefundStatus, VariationId,
};

/// A customer order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_email: String,
    pub status: OrderStatus,
    pub total: Decimal,
    pub coupon_code: Option<String>,
    pub placed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A line on an order, with the product name joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub product_name: String,
    pub variation_id: Option<VariationId>,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// An order with its lines and refund totals.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Sum of all non-rejected refunds.
    pub refunded_total: Decimal,
    /// Amount still refundable.
    pub refundable: Decimal,
}

/// A refund request against an order.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Refund {
    pub id: RefundId,
    pub order_id: OrderId,
    pub order_number: String,
    pub amount: Decimal,
    pub reason: String,
    pub status: RefundStatus,
    pub note: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for a new refund.
#[derive(Debug, Clone)]
pub struct RefundDraft {
    pub order_id: OrderId,
    pub amount: Decimal,
    pub reason: String,
    pub note: Option<String>,
}

/// A cart that was left without checking out.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AbandonedCart {
    pub id: CartId,
    pub customer_email: Option<String>,
    pub session_token: Option<Uuid>,
    pub item_count: i64,
    pub cart_value: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub recovered_at: Option<DateTime<Utc>>,
}

/// Aggregate abandonment figures for a time window.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AbandonedCartStats {
    /// Inactivity window in hours.
    pub hours: i64,
    /// Abandoned carts (recovered ones included).
    pub abandoned: i64,
    /// Combined value of the abandoned carts.
    pub total_value: Decimal,
    /// How many of them were marked recovered.
    pub recovered: i64,
    /// `recovered / abandoned` as a percentage, two decimal places.
    pub recovery_rate: Decimal,
}

impl AbandonedCartStats {
    /// Build stats, deriving the recovery rate.
    #[must_use]
    pub fn new(hours: i64, abandoned: i64, total_value: Decimal, recovered: i64) -> Self {
        let recovery_rate = if abandoned == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(recovered) * Decimal::ONE_HUNDRED / Decimal::from(abandoned))
                .round_dp(2)
        };
        Self {
            hours,
            abandoned,
            total_value,
            recovered,
            recovery_rate,
        }
    }
}
