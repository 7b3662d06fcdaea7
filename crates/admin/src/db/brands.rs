//! Brand repository.

use sqlx::PgPool;

use emporium_core::BrandId;

use super::{RepositoryError, like_pattern};
use crate::models::{Brand, BrandDraft};

const BRAND_COLUMNS: &str = "id, name, url_handle, description, logo_url, created_at, updated_at";

fn duplicate_handle(handle: &str) -> String {
    format!("A brand with URL handle '{handle}' already exists")
}

/// Repository for brand database operations.
pub struct BrandRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BrandRepository<'a> {
    /// Create a new brand repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List brands ordered by name, optionally filtered by a name search.
    ///
    /// Returns the page of brands and the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Brand>, i64), RepositoryError> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);

        let brands = sqlx::query_as::<_, Brand>(&format!(
            "SELECT {BRAND_COLUMNS} FROM admin.brand
             WHERE ($1::text IS NULL OR name ILIKE $1)
             ORDER BY name, id
             LIMIT $2 OFFSET $3"
        ))
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin.brand WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(pattern.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok((brands, total))
    }

    /// Get a brand by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        let brand = sqlx::query_as::<_, Brand>(&format!(
            "SELECT {BRAND_COLUMNS} FROM admin.brand WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(brand)
    }

    /// Create a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the URL handle is taken; no
    /// row is written in that case.
    pub async fn create(&self, draft: &BrandDraft) -> Result<Brand, RepositoryError> {
        sqlx::query_as::<_, Brand>(&format!(
            "INSERT INTO admin.brand (name, url_handle, description, logo_url)
             VALUES ($1, $2, $3, $4)
             RETURNING {BRAND_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(draft.url_handle.as_str())
        .bind(draft.description.as_deref())
        .bind(draft.logo_url.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or(e, || duplicate_handle(draft.url_handle.as_str())))
    }

    /// Replace a brand's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand doesn't exist, or
    /// `RepositoryError::Conflict` if the new URL handle is taken.
    pub async fn update(&self, id: BrandId, draft: &BrandDraft) -> Result<Brand, RepositoryError> {
        sqlx::query_as::<_, Brand>(&format!(
            "UPDATE admin.brand
             SET name = $2, url_handle = $3, description = $4, logo_url = $5, updated_at = NOW()
             WHERE id = $1
             RETURNING {BRAND_COLUMNS}"
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(draft.url_handle.as_str())
        .bind(draft.description.as_deref())
        .bind(draft.logo_url.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or(e, || duplicate_handle(draft.url_handle.as_str())))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a brand that no product references.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` (with the product count) while
    /// products reference the brand, `RepositoryError::NotFound` if it
    /// doesn't exist.
    pub async fn delete(&self, id: BrandId) -> Result<(), RepositoryError> {
        let products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admin.product WHERE brand_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        if products > 0 {
            return Err(RepositoryError::Conflict(format!(
                "Cannot delete brand: it is used by {products} product(s)"
            )));
        }

        let result = sqlx::query("DELETE FROM admin.brand WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::constraint_or(e, || {
                    "Cannot delete brand: it is still referenced".to_owned()
                })
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
