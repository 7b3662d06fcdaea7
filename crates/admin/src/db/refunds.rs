//! Refund repository.
//!
//! Creation and status changes run in a transaction holding a row lock on
//! the order, so concurrent requests cannot refund more than the order total.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use emporium_core::{OrderId, OrderStatus, RefundId, RefundStatus};

use super::RepositoryError;
use crate::models::{Refund, RefundDraft};

const REFUND_SELECT: &str = r"
    SELECT r.id, r.order_id, o.order_number, r.amount, r.reason, r.status, r.note,
           r.processed_at, r.created_at, r.updated_at
    FROM admin.refund r
    JOIN admin.customer_order o ON o.id = r.order_id";

/// Check that a new refund fits within what is left of the order total.
///
/// # Errors
///
/// Returns the reason the amount is rejected.
pub fn check_refund_amount(
    amount: Decimal,
    order_total: Decimal,
    already_refunded: Decimal,
) -> Result<(), String> {
    if amount <= Decimal::ZERO {
        return Err("Refund amount must be greater than zero".to_owned());
    }
    let remaining = (order_total - already_refunded).max(Decimal::ZERO);
    if amount > remaining {
        return Err(format!(
            "Refund amount {amount:.2} exceeds the refundable balance of {remaining:.2}"
        ));
    }
    Ok(())
}

/// Order status once `processed_total` has been paid back.
#[must_use]
pub fn order_status_after_refund(order_total: Decimal, processed_total: Decimal) -> OrderStatus {
    if processed_total >= order_total {
        OrderStatus::Refunded
    } else {
        OrderStatus::PartiallyRefunded
    }
}

/// Repository for refund database operations.
pub struct RefundRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> RefundRepository<'a> {
    /// Create a new refund repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List refunds, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<RefundStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Refund>, i64), RepositoryError> {
        let status = status.map(|s| s.as_str());

        let refunds = sqlx::query_as::<_, Refund>(&format!(
            "{REFUND_SELECT} WHERE ($1::text IS NULL OR r.status = $1)
             ORDER BY r.created_at DESC, r.id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(status)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin.refund WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok((refunds, total))
    }

    /// Get a refund by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: RefundId) -> Result<Option<Refund>, RepositoryError> {
        let refund = sqlx::query_as::<_, Refund>(&format!("{REFUND_SELECT} WHERE r.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(refund)
    }

    /// Create a pending refund.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist, or
    /// `RepositoryError::Invalid` if the amount exceeds the refundable balance.
    pub async fn create(&self, draft: &RefundDraft) -> Result<Refund, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order_total = lock_order_total(&mut tx, draft.order_id).await?;
        let already: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(amount), 0) FROM admin.refund
             WHERE order_id = $1 AND status <> 'rejected'",
        )
        .bind(draft.order_id)
        .fetch_one(&mut *tx)
        .await?;

        check_refund_amount(draft.amount, order_total, already).map_err(RepositoryError::Invalid)?;

        let id: RefundId = sqlx::query_scalar(
            r"
            INSERT INTO admin.refund (order_id, amount, reason, note)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(draft.order_id)
        .bind(draft.amount)
        .bind(&draft.reason)
        .bind(draft.note.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Move a refund to `next`.
    ///
    /// Processing stamps `processed_at` and updates the order to `refunded`
    /// or `partially_refunded` based on all processed refunds.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the refund doesn't exist, or
    /// `RepositoryError::Conflict` if the transition is not allowed.
    pub async fn transition(
        &self,
        id: RefundId,
        next: RefundStatus,
        note: Option<&str>,
    ) -> Result<Refund, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(OrderId, RefundStatus)> = sqlx::query_as(
            "SELECT order_id, status FROM admin.refund WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let (order_id, status) = current.ok_or(RepositoryError::NotFound)?;

        if !status.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "Cannot move refund from {status} to {next}"
            )));
        }

        let processed_at: Option<DateTime<Utc>> =
            (next == RefundStatus::Processed).then(Utc::now);

        sqlx::query(
            r"
            UPDATE admin.refund
            SET status = $2, note = COALESCE($3, note),
                processed_at = COALESCE($4, processed_at), updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(next)
        .bind(note)
        .bind(processed_at)
        .execute(&mut *tx)
        .await?;

        if next == RefundStatus::Processed {
            let order_total = lock_order_total(&mut tx, order_id).await?;
            let processed: Decimal = sqlx::query_scalar(
                "SELECT COALESCE(SUM(amount), 0) FROM admin.refund
                 WHERE order_id = $1 AND status = 'processed'",
            )
            .bind(order_id)
            .fetch_one(&mut *tx)
            .await?;

            let order_status = order_status_after_refund(order_total, processed);
            sqlx::query(
                "UPDATE admin.customer_order SET status = $2, updated_at = NOW() WHERE id = $1",
            )
            .bind(order_id)
            .bind(order_status)
            .execute(&mut *tx)
            .await?;

            tracing::info!(%id, %order_id, %order_status, "Refund processed");
        }

        tx.commit().await?;
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }
}

async fn lock_order_total(
    tx: &mut Transaction<'_, Postgres>,
    order_id: OrderId,
) -> Result<Decimal, RepositoryError> {
    sqlx::query_scalar("SELECT total FROM admin.customer_order WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(RepositoryError::NotFound)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dollars(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_check_refund_amount_within_balance() {
        assert!(check_refund_amount(dollars(1000), dollars(5000), dollars(4000)).is_ok());
        assert!(check_refund_amount(dollars(5000), dollars(5000), Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_check_refund_amount_rejects_excess() {
        let err = check_refund_amount(dollars(1001), dollars(5000), dollars(4000)).unwrap_err();
        assert_eq!(
            err,
            "Refund amount 10.01 exceeds the refundable balance of 10.00"
        );
        assert!(check_refund_amount(Decimal::ZERO, dollars(5000), Decimal::ZERO).is_err());
        assert!(check_refund_amount(dollars(-1), dollars(5000), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_order_status_after_refund() {
        assert_eq!(
            order_status_after_refund(dollars(5000), dollars(5000)),
            OrderStatus::Refunded
        );
        assert_eq!(
            order_status_after_refund(dollars(5000), dollars(100)),
            OrderStatus::PartiallyRefunded
        );
    }
}
