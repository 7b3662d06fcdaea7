//! Category (taxonomy) repository.

use sqlx::PgPool;

use emporium_core::CategoryId;

use super::RepositoryError;
use crate::models::{Category, CategoryDraft};

const CATEGORY_COLUMNS: &str =
    "id, name, slug, level, parent_id, description, created_at, updated_at";

fn duplicate_slug(slug: &str) -> String {
    format!("A category with slug '{slug}' already exists")
}

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List every category, parents before children, then by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM admin.category
             ORDER BY CASE level WHEN 'department' THEN 0 WHEN 'type' THEN 1 ELSE 2 END, name, id"
        ))
        .fetch_all(self.pool)
        .await?;
        Ok(categories)
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM admin.category WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(category)
    }

    /// Number of direct children of a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn child_count(&self, id: CategoryId) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM admin.category WHERE parent_id = $1")
            .bind(id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }

    /// Create a category. Placement must already be validated against the parent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, draft: &CategoryDraft) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(&format!(
            "INSERT INTO admin.category (name, slug, level, parent_id, description)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(&draft.name)
        .bind(draft.slug.as_str())
        .bind(draft.level)
        .bind(draft.parent_id)
        .bind(draft.description.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or(e, || duplicate_slug(draft.slug.as_str())))
    }

    /// Replace a category's fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category doesn't exist, or
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(
        &self,
        id: CategoryId,
        draft: &CategoryDraft,
    ) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>(&format!(
            "UPDATE admin.category
             SET name = $2, slug = $3, level = $4, parent_id = $5, description = $6,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {CATEGORY_COLUMNS}"
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(draft.slug.as_str())
        .bind(draft.level)
        .bind(draft.parent_id)
        .bind(draft.description.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or(e, || duplicate_slug(draft.slug.as_str())))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a category with no children and no products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` while children or products
    /// reference it, `RepositoryError::NotFound` if it doesn't exist.
    pub async fn delete(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let children = self.child_count(id).await?;
        if children > 0 {
            return Err(RepositoryError::Conflict(format!(
                "Cannot delete category: it has {children} child categor{}",
                if children == 1 { "y" } else { "ies" }
            )));
        }

        let products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admin.product WHERE category_id = $1")
                .bind(id)
                .fetch_one(self.pool)
                .await?;
        if products > 0 {
            return Err(RepositoryError::Conflict(format!(
                "Cannot delete category: it is used by {products} product(s)"
            )));
        }

        let result = sqlx::query("DELETE FROM admin.category WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| {
                RepositoryError::constraint_or(e, || {
                    "Cannot delete category: it is still referenced".to_owned()
                })
            })?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
