//! Whole-table access for the data manager (export and fixture import).
//!
//! Only the tables listed in [`Table`] can be read or written here; table
//! names coming from requests are parsed into [`Table`] before any SQL is
//! built, so no caller-supplied text reaches a query.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;

use super::RepositoryError;

/// A table managed by export and import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Brand,
    Category,
    Product,
    ProductVariation,
    CustomerOrder,
    OrderItem,
    Refund,
    Cart,
    CartItem,
    Coupon,
    Page,
}

/// Error returned for a table name outside [`Table::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown table '{0}'")]
pub struct UnknownTable(pub String);

impl Table {
    /// Every managed table, parents before children (foreign-key order).
    pub const ALL: [Self; 11] = [
        Self::Brand,
        Self::Category,
        Self::Product,
        Self::ProductVariation,
        Self::CustomerOrder,
        Self::OrderItem,
        Self::Refund,
        Self::Cart,
        Self::CartItem,
        Self::Coupon,
        Self::Page,
    ];

    /// Unqualified table name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Brand => "brand",
            Self::Category => "category",
            Self::Product => "product",
            Self::ProductVariation => "product_variation",
            Self::CustomerOrder => "customer_order",
            Self::OrderItem => "order_item",
            Self::Refund => "refund",
            Self::Cart => "cart",
            Self::CartItem => "cart_item",
            Self::Coupon => "coupon",
            Self::Page => "page",
        }
    }

    /// Schema-qualified table name.
    #[must_use]
    pub fn qualified(&self) -> String {
        format!("admin.{}", self.name())
    }

    /// Parse a comma-separated list such as `"brand, product"`.
    ///
    /// Empty segments are skipped and duplicates collapsed; the result keeps
    /// foreign-key order rather than input order.
    ///
    /// # Errors
    ///
    /// Returns [`UnknownTable`] for the first name that is not managed.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, UnknownTable> {
        let mut tables = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Self>, _>>()?;
        tables.sort_unstable();
        tables.dedup();
        Ok(tables)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = UnknownTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        let wanted = wanted.strip_prefix("admin.").unwrap_or(&wanted);
        Self::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| UnknownTable(s.to_owned()))
    }
}

/// Row count for one table.
#[derive(Debug, Clone, Serialize)]
pub struct TableInfo {
    pub table: Table,
    pub rows: i64,
}

/// Repository for whole-table reads and import bookkeeping.
pub struct TableRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TableRepository<'a> {
    /// Create a new table repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Row counts for every managed table.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn row_counts(&self) -> Result<Vec<TableInfo>, RepositoryError> {
        let mut infos = Vec::with_capacity(Table::ALL.len());
        for table in Table::ALL {
            let rows: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table.qualified()))
                .fetch_one(self.pool)
                .await?;
            infos.push(TableInfo { table, rows });
        }
        Ok(infos)
    }

    /// Read every row of `table` as JSON objects, ordered by primary key.
    ///
    /// Column names are the database's `snake_case` names; timestamps are
    /// RFC 3339 strings and numerics JSON numbers.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `RepositoryError::DataCorruption` if a row is not a JSON object.
    pub async fn fetch_rows(&self, table: Table) -> Result<Vec<Map<String, Value>>, RepositoryError> {
        let rows: Value = sqlx::query_scalar(&format!(
            "SELECT COALESCE(json_agg(t), '[]'::json) FROM (SELECT * FROM {} ORDER BY id) t",
            table.qualified()
        ))
        .fetch_one(self.pool)
        .await?;

        let Value::Array(rows) = rows else {
            return Err(RepositoryError::DataCorruption(format!(
                "{table}: expected a JSON array of rows"
            )));
        };

        rows.into_iter()
            .map(|row| match row {
                Value::Object(map) => Ok(map),
                other => Err(RepositoryError::DataCorruption(format!(
                    "{table}: expected a row object, got {other}"
                ))),
            })
            .collect()
    }

    /// Declared column names of `table`, in table order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn columns(&self, table: Table) -> Result<Vec<String>, RepositoryError> {
        let columns: Vec<String> = sqlx::query_scalar(
            "SELECT column_name::text FROM information_schema.columns
             WHERE table_schema = 'admin' AND table_name = $1
             ORDER BY ordinal_position",
        )
        .bind(table.name())
        .fetch_all(self.pool)
        .await?;
        Ok(columns)
    }

    /// Move the table's id sequence past the largest stored id, so rows
    /// imported with explicit ids don't collide with later inserts.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn reset_sequence(&self, table: Table) -> Result<(), RepositoryError> {
        let qualified = table.qualified();
        sqlx::query(&format!(
            "SELECT setval(pg_get_serial_sequence('{qualified}', 'id'),
                           COALESCE((SELECT MAX(id) FROM {qualified}), 1),
                           (SELECT MAX(id) FROM {qualified}) IS NOT NULL)"
        ))
        .execute(self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_accepts_known_tables() {
        assert_eq!("brand".parse::<Table>().unwrap(), Table::Brand);
        assert_eq!(" Product_Variation ".parse::<Table>().unwrap(), Table::ProductVariation);
        assert_eq!("admin.page".parse::<Table>().unwrap(), Table::Page);
    }

    #[test]
    fn test_from_str_rejects_unknown_tables() {
        assert_eq!(
            "admin_user".parse::<Table>(),
            Err(UnknownTable("admin_user".to_string()))
        );
        assert!("brand; DROP TABLE x".parse::<Table>().is_err());
    }

    #[test]
    fn test_parse_list_orders_by_foreign_keys() {
        let tables = Table::parse_list("page, brand,,product,brand").unwrap();
        assert_eq!(tables, vec![Table::Brand, Table::Product, Table::Page]);
        assert!(Table::parse_list(" , ").unwrap().is_empty());
        assert!(Table::parse_list("brand,nope").is_err());
    }

    #[test]
    fn test_all_is_in_declaration_order() {
        let mut sorted = Table::ALL;
        sorted.sort_unstable();
        assert_eq!(sorted, Table::ALL);
        assert_eq!(Table::CartItem.qualified(), "admin.cart_item");
    }
}
