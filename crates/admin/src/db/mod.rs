//! Database operations for the admin `PostgreSQL` schema.
//!
//! # Schema: `admin`
//!
//! ## Tables
//!
//! - `admin_user` - Back-office accounts (argon2 password hashes)
//! - `session` - tower-sessions storage
//! - `settings` - Key/value application settings (JSONB)
//! - `brand`, `category`, `product`, `product_variation` - Catalog
//! - `customer_order`, `order_item`, `refund` - Sales
//! - `cart`, `cart_item` - Shopping carts (abandonment tracking)
//! - `coupon`, `page` - Marketing and CMS content
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p emporium-cli -- migrate
//! ```
//!
//! Queries are built at runtime (`sqlx::query_as` with `FromRow` row types)
//! so the crate builds without a live database.

pub mod admin_users;
pub mod brands;
pub mod carts;
pub mod categories;
pub mod coupons;
pub mod dashboard;
pub mod orders;
pub mod pages;
pub mod products;
pub mod refunds;
pub mod settings;
pub mod tables;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_users::AdminUserRepository;
pub use brands::BrandRepository;
pub use carts::CartRepository;
pub use categories::CategoryRepository;
pub use coupons::CouponRepository;
pub use dashboard::DashboardRepository;
pub use orders::OrderRepository;
pub use pages::PageRepository;
pub use products::ProductRepository;
pub use refunds::RefundRepository;
pub use tables::TableRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique handle, referenced row).
    #[error("{0}")]
    Conflict(String),

    /// Input rejected by a rule checked against stored data
    /// (e.g., a refund larger than the refundable amount).
    #[error("{0}")]
    Invalid(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict(message)`, anything
    /// else to `Database`.
    pub(crate) fn unique_or(e: sqlx::Error, message: impl FnOnce() -> String) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return Self::Conflict(message());
        }
        Self::Database(e)
    }

    /// Map a foreign-key violation to `Conflict(message)`, anything else
    /// through [`RepositoryError::unique_or`] with the same message.
    pub(crate) fn constraint_or(e: sqlx::Error, message: impl FnOnce() -> String) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return Self::Conflict(message());
        }
        Self::unique_or(e, message)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Clamp user-supplied paging values to `(limit, offset)`.
///
/// `page` is 1-based; `per_page` is capped at 200 and defaults to 50.
#[must_use]
pub fn page_bounds(page: Option<i64>, per_page: Option<i64>) -> (i64, i64) {
    let per_page = per_page.unwrap_or(50).clamp(1, 200);
    let page = page.unwrap_or(1).max(1);
    (per_page, (page - 1).saturating_mul(per_page))
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
#[must_use]
pub fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.trim().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_bounds_defaults_and_clamps() {
        assert_eq!(page_bounds(None, None), (50, 0));
        assert_eq!(page_bounds(Some(3), Some(20)), (20, 40));
        assert_eq!(page_bounds(Some(0), Some(1000)), (200, 0));
        assert_eq!(page_bounds(Some(-4), Some(0)), (1, 0));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("tea"), "%tea%");
        assert_eq!(like_pattern(" 50%_off "), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
