//! Per-table row inserts for fixture import.
//!
//! Rows may carry explicit ids; those are kept so foreign keys between
//! fixture files stay valid. Rows without an id take the next sequence
//! value.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use emporium_core::{CategoryLevel, CouponKind, OrderStatus, PageStatus, ProductStatus, RefundStatus, Slug};

use super::coerce;
use crate::db::tables::Table;

/// Why a single row could not be imported.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("row is not a JSON object")]
    NotAnObject,

    #[error("missing required field '{0}'")]
    Missing(&'static str),

    #[error("invalid value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// What an import did with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    Inserted,
    Updated,
}

/// A fixture row with camelCase keys and lenient typed accessors.
#[derive(Debug, Clone)]
pub struct FixtureRow {
    fields: Map<String, Value>,
}

impl FixtureRow {
    /// Wrap a raw JSON row, renaming `snake_case` keys to camelCase.
    ///
    /// # Errors
    ///
    /// Returns `RowError::NotAnObject` for anything but an object.
    pub fn from_value(value: Value) -> Result<Self, RowError> {
        match value {
            Value::Object(fields) => Ok(Self {
                fields: coerce::normalize_keys(fields),
            }),
            _ => Err(RowError::NotAnObject),
        }
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn id(&self) -> Option<i32> {
        self.int("id")
    }

    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(coerce::text)
    }

    fn required_text(&self, key: &'static str) -> Result<String, RowError> {
        self.text(key).ok_or(RowError::Missing(key))
    }

    #[must_use]
    pub fn int(&self, key: &str) -> Option<i32> {
        self.get(key).and_then(coerce::int32)
    }

    fn required_int(&self, key: &'static str) -> Result<i32, RowError> {
        self.int(key).ok_or(RowError::Missing(key))
    }

    #[must_use]
    pub fn decimal(&self, key: &str) -> Option<Decimal> {
        self.get(key).and_then(coerce::decimal)
    }

    fn required_decimal(&self, key: &'static str) -> Result<Decimal, RowError> {
        self.decimal(key).ok_or(RowError::Missing(key))
    }

    #[must_use]
    pub fn datetime(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get(key).and_then(coerce::datetime)
    }

    /// For NOT NULL timestamp columns: unparseable or missing becomes now.
    #[must_use]
    pub fn datetime_or_now(&self, key: &str) -> DateTime<Utc> {
        self.datetime(key).unwrap_or_else(Utc::now)
    }

    #[must_use]
    pub fn uuid(&self, key: &str) -> Option<Uuid> {
        self.get(key).and_then(coerce::uuid)
    }

    #[must_use]
    pub fn boolean_or(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(coerce::boolean).unwrap_or(default)
    }

    #[must_use]
    pub fn enum_or_default<T: core::str::FromStr + Default>(&self, key: &str) -> T {
        coerce::enum_or_default(self.get(key))
    }

    fn enum_value<T: core::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(coerce::enum_value)
    }

    /// An explicit slug-like field, or one generated from `source`.
    /// Non-canonical explicit values are re-slugified.
    fn slug(&self, key: &'static str, source: &'static str) -> Result<String, RowError> {
        let slug = match self.text(key) {
            Some(explicit) => Slug::parse(&explicit).or_else(|_| Slug::generate(&explicit)),
            None => Slug::generate(&self.text(source).unwrap_or_default()),
        };
        slug.map(Slug::into_inner)
            .map_err(|e| RowError::Invalid {
                field: key,
                message: e.to_string(),
            })
    }

    /// Category level: explicit, or `department` when there is no parent.
    fn category_level(&self) -> Result<CategoryLevel, RowError> {
        match self.enum_value::<CategoryLevel>("level") {
            Some(level) => Ok(level),
            None if self.int("parentId").is_none() => Ok(CategoryLevel::Department),
            None => Err(RowError::Missing("level")),
        }
    }

    /// Ordering key so parents are inserted before children.
    #[must_use]
    pub fn sort_key(&self, table: Table) -> (u8, i32) {
        let rank = match table {
            Table::Category => match self.enum_value::<CategoryLevel>("level") {
                Some(CategoryLevel::Type) => 1,
                Some(CategoryLevel::Subtype) => 2,
                _ if self.int("parentId").is_some() => 1,
                _ => 0,
            },
            _ => 0,
        };
        (rank, self.id().unwrap_or(i32::MAX))
    }
}

/// `COALESCE($1, nextval(...))` for a table's id column.
fn id_expr(table: Table) -> String {
    format!(
        "COALESCE($1::int, nextval(pg_get_serial_sequence('{}', 'id'))::int)",
        table.qualified()
    )
}

/// Insert (or, for coupons, upsert by code) one row.
///
/// # Errors
///
/// Returns `RowError` when a required field is missing or the database
/// rejects the row.
pub async fn insert_row(pool: &PgPool, table: Table, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    match table {
        Table::Brand => insert_brand(pool, row).await,
        Table::Category => insert_category(pool, row).await,
        Table::Product => insert_product(pool, row).await,
        Table::ProductVariation => insert_variation(pool, row).await,
        Table::CustomerOrder => insert_order(pool, row).await,
        Table::OrderItem => insert_order_item(pool, row).await,
        Table::Refund => insert_refund(pool, row).await,
        Table::Cart => insert_cart(pool, row).await,
        Table::CartItem => insert_cart_item(pool, row).await,
        Table::Coupon => upsert_coupon(pool, row).await,
        Table::Page => insert_page(pool, row).await,
    }
}

async fn insert_brand(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    let name = row.required_text("name")?;
    let url_handle = row.slug("urlHandle", "name")?;

    sqlx::query(&format!(
        "INSERT INTO admin.brand (id, name, url_handle, description, logo_url, created_at, updated_at)
         VALUES ({}, $2, $3, $4, $5, $6, $7)",
        id_expr(Table::Brand)
    ))
    .bind(row.id())
    .bind(name)
    .bind(url_handle)
    .bind(row.text("description"))
    .bind(row.text("logoUrl"))
    .bind(row.datetime_or_now("createdAt"))
    .bind(row.datetime_or_now("updatedAt"))
    .execute(pool)
    .await?;

    Ok(RowOutcome::Inserted)
}

async fn insert_category(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    let name = row.required_text("name")?;
    let slug = row.slug("slug", "name")?;
    let level = row.category_level()?;

    sqlx::query(&format!(
        "INSERT INTO admin.category (id, name, slug, level, parent_id, description, created_at, updated_at)
         VALUES ({}, $2, $3, $4, $5, $6, $7, $8)",
        id_expr(Table::Category)
    ))
    .bind(row.id())
    .bind(name)
    .bind(slug)
    .bind(level)
    .bind(row.int("parentId"))
    .bind(row.text("description"))
    .bind(row.datetime_or_now("createdAt"))
    .bind(row.datetime_or_now("updatedAt"))
    .execute(pool)
    .await?;

    Ok(RowOutcome::Inserted)
}

async fn insert_product(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    let name = row.required_text("name")?;
    let slug = row.slug("slug", "name")?;
    let base_price = row.required_decimal("basePrice")?;

    sqlx::query(&format!(
        "INSERT INTO admin.product
             (id, brand_id, category_id, name, slug, description, status, base_price,
              image_key, external_id, created_at, updated_at)
         VALUES ({}, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        id_expr(Table::Product)
    ))
    .bind(row.id())
    .bind(row.int("brandId"))
    .bind(row.int("categoryId"))
    .bind(name)
    .bind(slug)
    .bind(row.text("description"))
    .bind(row.enum_or_default::<ProductStatus>("status"))
    .bind(base_price)
    .bind(row.text("imageKey"))
    .bind(row.uuid("externalId"))
    .bind(row.datetime_or_now("createdAt"))
    .bind(row.datetime_or_now("updatedAt"))
    .execute(pool)
    .await?;

    Ok(RowOutcome::Inserted)
}

async fn insert_variation(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    let product_id = row.required_int("productId")?;
    let sku = row.required_text("sku")?;
    let name = row.required_text("name")?;
    let price = row.required_decimal("price")?;

    sqlx::query(&format!(
        "INSERT INTO admin.product_variation (id, product_id, sku, name, price, stock, created_at, updated_at)
         VALUES ({}, $2, $3, $4, $5, $6, $7, $8)",
        id_expr(Table::ProductVariation)
    ))
    .bind(row.id())
    .bind(product_id)
    .bind(sku)
    .bind(name)
    .bind(price)
    .bind(row.int("stock").unwrap_or(0))
    .bind(row.datetime_or_now("createdAt"))
    .bind(row.datetime_or_now("updatedAt"))
    .execute(pool)
    .await?;

    Ok(RowOutcome::Inserted)
}

async fn insert_order(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    let order_number = row.required_text("orderNumber")?;
    let customer_email = row.required_text("customerEmail")?;
    let total = row.required_decimal("total")?;

    sqlx::query(&format!(
        "INSERT INTO admin.customer_order
             (id, order_number, customer_email, status, total, coupon_code, placed_at, created_at, updated_at)
         VALUES ({}, $2, $3, $4, $5, $6, $7, $8, $9)",
        id_expr(Table::CustomerOrder)
    ))
    .bind(row.id())
    .bind(order_number)
    .bind(customer_email)
    .bind(row.enum_or_default::<OrderStatus>("status"))
    .bind(total)
    .bind(row.text("couponCode"))
    .bind(row.datetime_or_now("placedAt"))
    .bind(row.datetime_or_now("createdAt"))
    .bind(row.datetime_or_now("updatedAt"))
    .execute(pool)
    .await?;

    Ok(RowOutcome::Inserted)
}

async fn insert_order_item(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    let order_id = row.required_int("orderId")?;
    let product_id = row.required_int("productId")?;
    let unit_price = row.required_decimal("unitPrice")?;

    sqlx::query(&format!(
        "INSERT INTO admin.order_item (id, order_id, product_id, variation_id, quantity, unit_price)
         VALUES ({}, $2, $3, $4, $5, $6)",
        id_expr(Table::OrderItem)
    ))
    .bind(row.id())
    .bind(order_id)
    .bind(product_id)
    .bind(row.int("variationId"))
    .bind(row.int("quantity").unwrap_or(1))
    .bind(unit_price)
    .execute(pool)
    .await?;

    Ok(RowOutcome::Inserted)
}

async fn insert_refund(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    let order_id = row.required_int("orderId")?;
    let amount = row.required_decimal("amount")?;
    let reason = row.required_text("reason")?;

    sqlx::query(&format!(
        "INSERT INTO admin.refund
             (id, order_id, amount, reason, status, note, processed_at, created_at, updated_at)
         VALUES ({}, $2, $3, $4, $5, $6, $7, $8, $9)",
        id_expr(Table::Refund)
    ))
    .bind(row.id())
    .bind(order_id)
    .bind(amount)
    .bind(reason)
    .bind(row.enum_or_default::<RefundStatus>("status"))
    .bind(row.text("note"))
    .bind(row.datetime("processedAt"))
    .bind(row.datetime_or_now("createdAt"))
    .bind(row.datetime_or_now("updatedAt"))
    .execute(pool)
    .await?;

    Ok(RowOutcome::Inserted)
}

async fn insert_cart(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    sqlx::query(&format!(
        "INSERT INTO admin.cart
             (id, customer_email, session_token, created_at, updated_at, checked_out_at, recovered_at)
         VALUES ({}, $2, $3, $4, $5, $6, $7)",
        id_expr(Table::Cart)
    ))
    .bind(row.id())
    .bind(row.text("customerEmail"))
    .bind(row.uuid("sessionToken"))
    .bind(row.datetime_or_now("createdAt"))
    .bind(row.datetime_or_now("updatedAt"))
    .bind(row.datetime("checkedOutAt"))
    .bind(row.datetime("recoveredAt"))
    .execute(pool)
    .await?;

    Ok(RowOutcome::Inserted)
}

async fn insert_cart_item(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    let cart_id = row.required_int("cartId")?;
    let product_id = row.required_int("productId")?;
    let unit_price = row.required_decimal("unitPrice")?;

    sqlx::query(&format!(
        "INSERT INTO admin.cart_item (id, cart_id, product_id, variation_id, quantity, unit_price, added_at)
         VALUES ({}, $2, $3, $4, $5, $6, $7)",
        id_expr(Table::CartItem)
    ))
    .bind(row.id())
    .bind(cart_id)
    .bind(product_id)
    .bind(row.int("variationId"))
    .bind(row.int("quantity").unwrap_or(1))
    .bind(unit_price)
    .bind(row.datetime_or_now("addedAt"))
    .execute(pool)
    .await?;

    Ok(RowOutcome::Inserted)
}

/// Coupons are matched on their uppercase code; an existing coupon keeps
/// its id and creation time.
async fn upsert_coupon(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    let code = row.required_text("code")?.to_uppercase();
    let kind = row
        .enum_value::<CouponKind>("kind")
        .ok_or(RowError::Missing("kind"))?;

    let inserted: bool = sqlx::query_scalar(&format!(
        "INSERT INTO admin.coupon
             (id, code, description, kind, value, min_order_total, usage_limit, times_used,
              starts_at, ends_at, active, created_at, updated_at)
         VALUES ({}, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
         ON CONFLICT (code) DO UPDATE SET
             description = EXCLUDED.description,
             kind = EXCLUDED.kind,
             value = EXCLUDED.value,
             min_order_total = EXCLUDED.min_order_total,
             usage_limit = EXCLUDED.usage_limit,
             times_used = EXCLUDED.times_used,
             starts_at = EXCLUDED.starts_at,
             ends_at = EXCLUDED.ends_at,
             active = EXCLUDED.active,
             updated_at = NOW()
         RETURNING (xmax = 0)",
        id_expr(Table::Coupon)
    ))
    .bind(row.id())
    .bind(code)
    .bind(row.text("description"))
    .bind(kind)
    .bind(row.decimal("value").unwrap_or(Decimal::ZERO))
    .bind(row.decimal("minOrderTotal"))
    .bind(row.int("usageLimit"))
    .bind(row.int("timesUsed").unwrap_or(0))
    .bind(row.datetime("startsAt"))
    .bind(row.datetime("endsAt"))
    .bind(row.boolean_or("active", true))
    .bind(row.datetime_or_now("createdAt"))
    .bind(row.datetime_or_now("updatedAt"))
    .fetch_one(pool)
    .await?;

    Ok(if inserted {
        RowOutcome::Inserted
    } else {
        RowOutcome::Updated
    })
}

async fn insert_page(pool: &PgPool, row: &FixtureRow) -> Result<RowOutcome, RowError> {
    let title = row.required_text("title")?;
    let slug = row.slug("slug", "title")?;
    let status = row.enum_or_default::<PageStatus>("status");
    let published_at = match (status, row.datetime("publishedAt")) {
        (PageStatus::Published, None) => Some(Utc::now()),
        (_, published_at) => published_at,
    };

    sqlx::query(&format!(
        "INSERT INTO admin.page
             (id, title, slug, body, meta_description, status, published_at, created_at, updated_at)
         VALUES ({}, $2, $3, $4, $5, $6, $7, $8, $9)",
        id_expr(Table::Page)
    ))
    .bind(row.id())
    .bind(title)
    .bind(slug)
    .bind(row.text("body").unwrap_or_default())
    .bind(row.text("metaDescription"))
    .bind(status)
    .bind(published_at)
    .bind(row.datetime_or_now("createdAt"))
    .bind(row.datetime_or_now("updatedAt"))
    .execute(pool)
    .await?;

    Ok(RowOutcome::Inserted)
}
