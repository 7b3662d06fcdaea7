//! Category taxonomy API (department → type → subtype).

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{CategoryId, CategoryLevel, Slug};

use super::{clean, required};
use crate::{
    db::CategoryRepository,
    error::AppError,
    middleware::{RequireAdminAuth, RequireWriteAccess},
    models::{Category, CategoryDraft, CategoryNode},
    state::AppState,
};

/// Build the categories router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/categories", get(list).post(create))
        .route("/api/categories/tree", get(tree))
        .route("/api/categories/{id}", get(show).put(update).delete(destroy))
}

/// Category create/update body.
#[derive(Debug, Deserialize)]
pub struct CategoryInput {
    pub name: String,
    pub slug: Option<String>,
    pub level: CategoryLevel,
    pub parent_id: Option<CategoryId>,
    pub description: Option<String>,
}

impl CategoryInput {
    fn into_draft(self) -> Result<CategoryDraft, AppError> {
        let name = required("Name", &self.name)?;
        let slug = Slug::from_input(self.slug.as_deref(), &name)?;
        Ok(CategoryDraft {
            name,
            slug,
            level: self.level,
            parent_id: self.parent_id,
            description: clean(self.description),
        })
    }
}

/// Load the draft's parent and check the placement rules.
async fn check_placement(
    repo: &CategoryRepository<'_>,
    draft: &CategoryDraft,
) -> Result<(), AppError> {
    let parent = match draft.parent_id {
        Some(parent_id) => Some(
            repo.get(parent_id)
                .await?
                .ok_or_else(|| AppError::BadRequest(format!("Parent category {parent_id} does not exist")))?,
        ),
        None => None,
    };
    draft
        .check_parent(parent.as_ref())
        .map_err(AppError::BadRequest)
}

#[instrument(skip(_admin, state))]
async fn list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(CategoryRepository::new(state.pool()).list_all().await?))
}

#[instrument(skip(_admin, state))]
async fn tree(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<CategoryNode>>, AppError> {
    let categories = CategoryRepository::new(state.pool()).list_all().await?;
    Ok(Json(CategoryNode::build_tree(categories)))
}

#[instrument(skip(_admin, state))]
async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>, AppError> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("category {id}")))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Json(body): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    let draft = body.into_draft()?;
    let repo = CategoryRepository::new(state.pool());
    check_placement(&repo, &draft).await?;

    let category = repo.create(&draft).await?;
    tracing::info!(category_id = %category.id, level = %category.level, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryInput>,
) -> Result<Json<Category>, AppError> {
    let draft = body.into_draft()?;
    if draft.parent_id == Some(id) {
        return Err(AppError::BadRequest(
            "A category cannot be its own parent".to_owned(),
        ));
    }

    let repo = CategoryRepository::new(state.pool());
    let current = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("category {id}")))?;
    check_placement(&repo, &draft).await?;

    // Children were placed for the current level.
    if current.level != draft.level && repo.child_count(id).await? > 0 {
        return Err(AppError::Conflict(
            "Cannot change the level of a category that has children".to_owned(),
        ));
    }

    Ok(Json(repo.update(id, &draft).await?))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn destroy(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode, AppError> {
    CategoryRepository::new(state.pool()).delete(id).await?;
    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_input_parses_level() {
        let input: CategoryInput = serde_json::from_value(serde_json::json!({
            "name": "Loose Leaf Tea",
            "level": "type",
            "parent_id": 3
        }))
        .unwrap();
        let draft = input.into_draft().unwrap();
        assert_eq!(draft.slug.as_str(), "loose-leaf-tea");
        assert_eq!(draft.level, CategoryLevel::Type);
        assert_eq!(draft.parent_id, Some(CategoryId::new(3)));
    }

    #[test]
    fn test_unknown_level_rejected() {
        let parsed: Result<CategoryInput, _> = serde_json::from_value(serde_json::json!({
            "name": "x",
            "level": "aisle"
        }));
        assert!(parsed.is_err());
    }
}
