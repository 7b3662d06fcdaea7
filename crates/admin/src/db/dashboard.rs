//! Dashboard counters.

use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;

/// Headline counts shown on the dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct DashboardCounts {
    pub products: i64,
    pub active_products: i64,
    pub orders: i64,
    pub pending_refunds: i64,
    pub abandoned_carts: i64,
    pub active_coupons: i64,
    pub published_pages: i64,
}

/// Repository for dashboard aggregates.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Compute all counters in one round trip.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self, abandoned_hours: i32) -> Result<DashboardCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r"
            SELECT
                (SELECT COUNT(*) FROM admin.product) AS products,
                (SELECT COUNT(*) FROM admin.product WHERE status = 'active') AS active_products,
                (SELECT COUNT(*) FROM admin.customer_order) AS orders,
                (SELECT COUNT(*) FROM admin.refund WHERE status = 'pending') AS pending_refunds,
                (SELECT COUNT(*) FROM admin.cart c
                  WHERE c.checked_out_at IS NULL
                    AND c.recovered_at IS NULL
                    AND c.updated_at < NOW() - make_interval(hours => $1)
                    AND EXISTS (SELECT 1 FROM admin.cart_item ci WHERE ci.cart_id = c.id)
                ) AS abandoned_carts,
                (SELECT COUNT(*) FROM admin.coupon
                  WHERE active
                    AND (starts_at IS NULL OR starts_at <= NOW())
                    AND (ends_at IS NULL OR ends_at > NOW())
                ) AS active_coupons,
                (SELECT COUNT(*) FROM admin.page WHERE status = 'published') AS published_pages
            ",
        )
        .bind(abandoned_hours)
        .fetch_one(self.pool)
        .await?;
        Ok(counts)
    }
}
