//! CMS page repository.

use sqlx::PgPool;

use emporium_core::{PageId, PageStatus};

use super::{RepositoryError, like_pattern};
use crate::models::{Page, PageDraft};

const PAGE_COLUMNS: &str =
    "id, title, slug, body, meta_description, status, published_at, created_at, updated_at";

fn duplicate_slug(slug: &str) -> String {
    format!("A page with slug '{slug}' already exists")
}

/// Repository for page database operations.
pub struct PageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PageRepository<'a> {
    /// Create a new page repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List pages by title, optionally filtered by status and a title search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<PageStatus>,
        search: Option<&str>,
    ) -> Result<Vec<Page>, RepositoryError> {
        let pattern = search.filter(|s| !s.trim().is_empty()).map(like_pattern);

        let pages = sqlx::query_as::<_, Page>(&format!(
            "SELECT {PAGE_COLUMNS} FROM admin.page
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::text IS NULL OR title ILIKE $2)
             ORDER BY title, id"
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(pattern.as_deref())
        .fetch_all(self.pool)
        .await?;
        Ok(pages)
    }

    /// Get a page by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: PageId) -> Result<Option<Page>, RepositoryError> {
        let page = sqlx::query_as::<_, Page>(&format!(
            "SELECT {PAGE_COLUMNS} FROM admin.page WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(page)
    }

    /// Get a page by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Page>, RepositoryError> {
        let page = sqlx::query_as::<_, Page>(&format!(
            "SELECT {PAGE_COLUMNS} FROM admin.page WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;
        Ok(page)
    }

    /// Create a draft page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    pub async fn create(&self, draft: &PageDraft) -> Result<Page, RepositoryError> {
        sqlx::query_as::<_, Page>(&format!(
            "INSERT INTO admin.page (title, slug, body, meta_description)
             VALUES ($1, $2, $3, $4)
             RETURNING {PAGE_COLUMNS}"
        ))
        .bind(&draft.title)
        .bind(draft.slug.as_str())
        .bind(&draft.body)
        .bind(draft.meta_description.as_deref())
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or(e, || duplicate_slug(draft.slug.as_str())))
    }

    /// Replace a page's content. Publication state is unchanged.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the page doesn't exist, or
    /// `RepositoryError::Conflict` if the slug is taken.
    pub async fn update(&self, id: PageId, draft: &PageDraft) -> Result<Page, RepositoryError> {
        sqlx::query_as::<_, Page>(&format!(
            "UPDATE admin.page
             SET title = $2, slug = $3, body = $4, meta_description = $5, updated_at = NOW()
             WHERE id = $1
             RETURNING {PAGE_COLUMNS}"
        ))
        .bind(id)
        .bind(&draft.title)
        .bind(draft.slug.as_str())
        .bind(&draft.body)
        .bind(draft.meta_description.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::unique_or(e, || duplicate_slug(draft.slug.as_str())))?
        .ok_or(RepositoryError::NotFound)
    }

    /// Set a page's status. The first publish stamps `published_at`;
    /// later publishes and unpublishes keep it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the page doesn't exist.
    pub async fn set_status(&self, id: PageId, status: PageStatus) -> Result<Page, RepositoryError> {
        sqlx::query_as::<_, Page>(&format!(
            "UPDATE admin.page
             SET status = $2,
                 published_at = CASE WHEN $2 = 'published' THEN COALESCE(published_at, NOW())
                                     ELSE published_at END,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {PAGE_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    /// Delete a page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the page doesn't exist.
    pub async fn delete(&self, id: PageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM admin.page WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
