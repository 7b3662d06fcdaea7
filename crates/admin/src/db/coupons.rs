//! Coupon repository.

use sqlx::PgPool;

use emporium_core::CouponId;

use super::{RepositoryError, like_pattern};
use crate::models::{Coupon, CouponDraft};

const COUPON_COLUMNS: &str = "id, code, description, kind, value, min_order_total, usage_limit, \
                              times_used, starts_at, ends_at, active, created_at, updated_at";

fn duplicate_code(code: &str) -> String {
    format!("A coupon with code '{code}' already exists")
}

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List coupons, newest first, optionally filtered by code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Coupon>, i64), RepositoryError> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);

        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM admin.coupon
             WHERE ($1::text IS NULL OR code ILIKE $1)
             ORDER BY created_at DESC, id DESC
             LIMIT $2 OFFSET $3"
        ))
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin.coupon WHERE ($1::text IS NULL OR code ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok((coupons, total))
    }

    /// Get a coupon by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CouponId) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM admin.coupon WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(coupon)
    }

    /// Get a coupon by its (uppercase) code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {COUPON_COLUMNS} FROM admin.coupon WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;
        Ok(coupon)
    }

    /// Create a coupon.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is taken.
    pub async fn create(&self, draft: &CouponDraft) -> Result<Coupon, RepositoryError> {
        sqlx::query_as::<_, Coupon>(&format!(
            "INSERT INTO admin.coupon
                (code, description, kind, value, min_order_total, usage_limit,
                 starts_at, ends_at, active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(&draft.code)
        .bind(draft.description.as_deref())
        .bind(draft.kind)
        .bind(draft.value)
        .bind(draft.min_order_total)
        .bind(draft.usage_limit)
        .bind(draft.starts_at)
        .bind(draft.ends_at)
        .bind(draft.active)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or(e, || duplicate_code(&draft.code)))
    }

    /// Replace a coupon's fields. Usage count is preserved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist, or
    /// `RepositoryError::Conflict` if the code is taken.
    pub async fn update(&self, id: CouponId, draft: &CouponDraft) -> Result<Coupon, RepositoryError> {
        sqlx::query_as::<_, Coupon>(&format!(
            "UPDATE admin.coupon
             SET code = $2, description = $3, kind = $4, value = $5, min_order_total = $6,
                 usage_limit = $7, starts_at = $8, ends_at = $9, active = $10,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {COUPON_COLUMNS}"
        ))
        .bind(id)
        .bind(&draft.code)
        .bind(draft.description.as_deref())
        .bind(draft.kind)
        .bind(draft.value)
        .bind(draft.min_order_total)
        .bind(draft.usage_limit)
        .bind(draft.starts_at)
        .bind(draft.ends_at)
        .bind(draft.active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or(e, || duplicate_code(&draft.code)))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a coupon. Orders keep the code as plain text.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist.
    pub async fn delete(&self, id: CouponId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.coupon WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
