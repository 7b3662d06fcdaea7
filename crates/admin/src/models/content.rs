//! Coupons and CMS pages.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use emporium_core::{CouponId, CouponKind, PageId, PageStatus, Slug};

/// A discount code.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Coupon {
    pub id: CouponId,
    /// Always uppercase.
    pub code: String,
    pub description: Option<String>,
    pub kind: CouponKind,
    pub value: Decimal,
    pub min_order_total: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub times_used: i32,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated coupon fields for create/update.
#[derive(Debug, Clone)]
pub struct CouponDraft {
    pub code: String,
    pub description: Option<String>,
    pub kind: CouponKind,
    pub value: Decimal,
    pub min_order_total: Option<Decimal>,
    pub usage_limit: Option<i32>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub active: bool,
}

/// A CMS page.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Page {
    pub id: PageId,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub meta_description: Option<String>,
    pub status: PageStatus,
    /// Set on first publish and kept afterwards.
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated page fields for create/update.
#[derive(Debug, Clone)]
pub struct PageDraft {
    pub title: String,
    pub slug: Slug,
    pub body: String,
    pub meta_description: Option<String>,
}
