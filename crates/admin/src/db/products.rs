//! Product and variation repository.

use sqlx::PgPool;

use emporium_core::{ProductId, VariationId};

use super::{RepositoryError, like_pattern};
use crate::models::{Product, ProductDetail, ProductDraft, ProductFilter, ProductVariation, VariationDraft};

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.brand_id, b.name AS brand_name, p.category_id, c.name AS category_name,
           p.name, p.slug, p.description, p.status, p.base_price, p.image_key, p.external_id,
           p.created_at, p.updated_at
    FROM admin.product p
    LEFT JOIN admin.brand b ON b.id = p.brand_id
    LEFT JOIN admin.category c ON c.id = p.category_id";

const PRODUCT_FILTER: &str = r"
    WHERE ($1::int IS NULL OR p.brand_id = $1)
      AND ($2::int IS NULL OR p.category_id = $2)
      AND ($3::text IS NULL OR p.status = $3)
      AND ($4::text IS NULL OR p.name ILIKE $4 OR p.slug ILIKE $4)";

const VARIATION_COLUMNS: &str = "id, product_id, sku, name, price, stock, created_at, updated_at";

fn duplicate_slug(slug: &str) -> String {
    format!("A product with slug '{slug}' already exists")
}

fn duplicate_sku(sku: &str) -> String {
    format!("A variation with SKU '{sku}' already exists")
}

/// Message returned when a product cannot be deleted because orders use it.
#[must_use]
pub fn referenced_by_orders(orders: i64) -> String {
    format!("Cannot delete product: it is referenced by {orders} order(s)")
}

/// Message for a delete rejected by a foreign key after the order check
/// passed, when the referencing count is unknown.
fn still_referenced() -> String {
    "Cannot delete product: it is still referenced".to_owned()
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List products matching `filter`, newest first.
    ///
    /// Returns the page and the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        let pattern = filter
            .search
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(like_pattern);
        let status = filter.status.map(|s| s.as_str());

        let products = sqlx::query_as::<_, Product>(&format!(
            "{PRODUCT_SELECT} {PRODUCT_FILTER} ORDER BY p.created_at DESC, p.id DESC LIMIT $5 OFFSET $6"
        ))
        .bind(filter.brand_id)
        .bind(filter.category_id)
        .bind(status)
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM admin.product p {PRODUCT_FILTER}"
        ))
        .bind(filter.brand_id)
        .bind(filter.category_id)
        .bind(status)
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok((products, total))
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(product)
    }

    /// Get a product with its variations.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(&self, id: ProductId) -> Result<Option<ProductDetail>, RepositoryError> {
        let Some(product) = self.get(id).await? else {
            return Ok(None);
        };
        let variations = self.list_variations(id).await?;
        Ok(Some(ProductDetail {
            product,
            variations,
        }))
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken or the
    /// brand/category does not exist.
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO admin.product
                (brand_id, category_id, name, slug, description, status, base_price, image_key, external_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            ",
        )
        .bind(draft.brand_id)
        .bind(draft.category_id)
        .bind(&draft.name)
        .bind(draft.slug.as_str())
        .bind(draft.description.as_deref())
        .bind(draft.status)
        .bind(draft.base_price)
        .bind(draft.image_key.as_deref())
        .bind(draft.external_id)
        .fetch_one(self.pool)
        .await
        .map_err(|e| Self::write_error(e, draft))?;

        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Replace a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist, or
    /// `RepositoryError::Conflict` on a duplicate slug or dangling reference.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Product, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE admin.product
            SET brand_id = $2, category_id = $3, name = $4, slug = $5, description = $6,
                status = $7, base_price = $8, image_key = $9, external_id = $10,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(draft.brand_id)
        .bind(draft.category_id)
        .bind(&draft.name)
        .bind(draft.slug.as_str())
        .bind(draft.description.as_deref())
        .bind(draft.status)
        .bind(draft.base_price)
        .bind(draft.image_key.as_deref())
        .bind(draft.external_id)
        .execute(self.pool)
        .await
        .map_err(|e| Self::write_error(e, draft))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    fn write_error(e: sqlx::Error, draft: &ProductDraft) -> RepositoryError {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_foreign_key_violation()
        {
            return RepositoryError::Conflict(
                "The selected brand or category does not exist".to_owned(),
            );
        }
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.constraint() == Some("product_external_id_key")
        {
            return RepositoryError::Conflict(
                "A product with this external ID already exists".to_owned(),
            );
        }
        RepositoryError::unique_or(e, || duplicate_slug(draft.slug.as_str()))
    }

    /// Number of distinct orders containing this product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn order_count(&self, id: ProductId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT order_id) FROM admin.order_item WHERE product_id = $1",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;
        Ok(count)
    }

    /// Delete a product that no order references. Variations and cart lines
    /// go with it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` with the order count while order
    /// items reference the product; the product is left untouched.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let orders = self.order_count(id).await?;
        if orders > 0 {
            return Err(RepositoryError::Conflict(referenced_by_orders(orders)));
        }

        let result = sqlx::query("DELETE FROM admin.product WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| RepositoryError::constraint_or(e, still_referenced))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    // =========================================================================
    // Variations
    // =========================================================================

    /// List a product's variations by SKU.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_variations(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductVariation>, RepositoryError> {
        let variations = sqlx::query_as::<_, ProductVariation>(&format!(
            "SELECT {VARIATION_COLUMNS} FROM admin.product_variation
             WHERE product_id = $1 ORDER BY sku"
        ))
        .bind(product_id)
        .fetch_all(self.pool)
        .await?;
        Ok(variations)
    }

    /// Add a variation to a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the SKU is taken, or
    /// `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn create_variation(
        &self,
        product_id: ProductId,
        draft: &VariationDraft,
    ) -> Result<ProductVariation, RepositoryError> {
        sqlx::query_as::<_, ProductVariation>(&format!(
            "INSERT INTO admin.product_variation (product_id, sku, name, price, stock)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {VARIATION_COLUMNS}"
        ))
        .bind(product_id)
        .bind(&draft.sku)
        .bind(&draft.name)
        .bind(draft.price)
        .bind(draft.stock)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::unique_or(e, || duplicate_sku(&draft.sku))
        })
    }

    /// Replace a variation's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variation doesn't belong to
    /// the product, or `RepositoryError::Conflict` if the SKU is taken.
    pub async fn update_variation(
        &self,
        product_id: ProductId,
        id: VariationId,
        draft: &VariationDraft,
    ) -> Result<ProductVariation, RepositoryError> {
        sqlx::query_as::<_, ProductVariation>(&format!(
            "UPDATE admin.product_variation
             SET sku = $3, name = $4, price = $5, stock = $6, updated_at = NOW()
             WHERE id = $1 AND product_id = $2
             RETURNING {VARIATION_COLUMNS}"
        ))
        .bind(id)
        .bind(product_id)
        .bind(&draft.sku)
        .bind(&draft.name)
        .bind(draft.price)
        .bind(draft.stock)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or(e, || duplicate_sku(&draft.sku)))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a variation. Order lines keep their history with a null variation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the variation doesn't belong to
    /// the product.
    pub async fn delete_variation(
        &self,
        product_id: ProductId,
        id: VariationId,
    ) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("DELETE FROM admin.product_variation WHERE id = $1 AND product_id = $2")
                .bind(id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referenced_by_orders_message() {
        assert_eq!(
            referenced_by_orders(3),
            "Cannot delete product: it is referenced by 3 order(s)"
        );
    }

    #[test]
    fn test_still_referenced_message_has_no_count() {
        let message = still_referenced();
        assert_eq!(message, "Cannot delete product: it is still referenced");
        assert!(!message.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_non_constraint_error_keeps_database_error() {
        let err = RepositoryError::constraint_or(sqlx::Error::RowNotFound, still_referenced);
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
