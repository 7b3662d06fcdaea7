//! Cart repository (abandonment tracking).
//!
//! A cart is abandoned when it has at least one item, was never checked out,
//! and has not been touched for the configured number of hours.

use rust_decimal::Decimal;
use sqlx::PgPool;

use emporium_core::CartId;

use super::RepositoryError;
use crate::models::{AbandonedCart, AbandonedCartStats};

const ABANDONED_CARTS: &str = r"
    SELECT c.id, c.customer_email, c.session_token,
           COUNT(ci.id) AS item_count,
           COALESCE(SUM(ci.quantity * ci.unit_price), 0) AS cart_value,
           c.created_at, c.updated_at, c.recovered_at
    FROM admin.cart c
    JOIN admin.cart_item ci ON ci.cart_id = c.id
    WHERE c.checked_out_at IS NULL
      AND c.updated_at < NOW() - make_interval(hours => $1)
    GROUP BY c.id";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List carts abandoned for more than `hours`, most recently active first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_abandoned(
        &self,
        hours: i32,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<AbandonedCart>, RepositoryError> {
        let carts = sqlx::query_as::<_, AbandonedCart>(&format!(
            "{ABANDONED_CARTS} ORDER BY c.updated_at DESC, c.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(hours)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(carts)
    }

    /// Abandonment figures for the `hours` window.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn abandoned_stats(&self, hours: i32) -> Result<AbandonedCartStats, RepositoryError> {
        let (abandoned, total_value, recovered): (i64, Decimal, i64) = sqlx::query_as(&format!(
            "SELECT COUNT(*), COALESCE(SUM(a.cart_value), 0),
                    COUNT(*) FILTER (WHERE a.recovered_at IS NOT NULL)
             FROM ({ABANDONED_CARTS}) a"
        ))
        .bind(hours)
        .fetch_one(self.pool)
        .await?;

        Ok(AbandonedCartStats::new(
            i64::from(hours),
            abandoned,
            total_value,
            recovered,
        ))
    }

    /// Mark a cart as recovered (e.g., after a reminder email converted).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    pub async fn mark_recovered(&self, id: CartId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE admin.cart SET recovered_at = COALESCE(recovered_at, NOW()) WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete a cart and its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart doesn't exist.
    pub async fn delete(&self, id: CartId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.cart WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
