//! Order repository (read-only; orders are created by the storefront).

use rust_decimal::Decimal;
use sqlx::PgPool;

use emporium_core::{OrderId, OrderStatus};

use super::RepositoryError;
use crate::models::{Order, OrderDetail, OrderItem};

const ORDER_COLUMNS: &str = "id, order_number, customer_email, status, total, coupon_code, \
                             placed_at, created_at, updated_at";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List orders, most recent first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<OrderStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let status = status.map(|s| s.as_str());

        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM admin.customer_order
             WHERE ($1::text IS NULL OR status = $1)
             ORDER BY placed_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin.customer_order WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok((orders, total))
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM admin.customer_order WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(order)
    }

    /// Get an order with its items and refund totals.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: OrderId) -> Result<Option<OrderDetail>, RepositoryError> {
        let Some(order) = self.get(id).await? else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItem>(
            r"
            SELECT oi.id, oi.order_id, oi.product_id, p.name AS product_name,
                   oi.variation_id, oi.quantity, oi.unit_price
            FROM admin.order_item oi
            JOIN admin.product p ON p.id = oi.product_id
            WHERE oi.order_id = $1
            ORDER BY oi.id
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        let refunded_total: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM admin.refund
             WHERE order_id = $1 AND status <> 'rejected'",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        let refundable = (order.total - refunded_total).max(Decimal::ZERO);
        Ok(Some(OrderDetail {
            order,
            items,
            refunded_total,
            refundable,
        }))
    }
}
