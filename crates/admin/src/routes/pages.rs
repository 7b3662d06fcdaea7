//! CMS page API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{PageId, PageStatus, Slug};

use super::{clean, required};
use crate::{
    db::PageRepository,
    error::AppError,
    middleware::{RequireAdminAuth, RequireWriteAccess},
    models::{Page, PageDraft},
    state::AppState,
};

/// Build the pages router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/pages", get(list).post(create))
        .route("/api/pages/slug/{slug}", get(show_by_slug))
        .route("/api/pages/{id}", get(show).put(update).delete(destroy))
        .route("/api/pages/{id}/publish", post(publish))
        .route("/api/pages/{id}/unpublish", post(unpublish))
}

/// Page listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub status: Option<PageStatus>,
    pub search: Option<String>,
}

/// Page create/update body.
#[derive(Debug, Deserialize)]
pub struct PageInput {
    pub title: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub body: String,
    pub meta_description: Option<String>,
}

impl PageInput {
    fn into_draft(self) -> Result<PageDraft, AppError> {
        let title = required("Title", &self.title)?;
        let slug = Slug::from_input(self.slug.as_deref(), &title)?;
        Ok(PageDraft {
            title,
            slug,
            body: self.body,
            meta_description: clean(self.meta_description),
        })
    }
}

#[instrument(skip(_admin, state))]
async fn list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<Vec<Page>>, AppError> {
    Ok(Json(
        PageRepository::new(state.pool())
            .list(query.status, query.search.as_deref())
            .await?,
    ))
}

#[instrument(skip(_admin, state))]
async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> Result<Json<Page>, AppError> {
    PageRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("page {id}")))
}

#[instrument(skip(_admin, state))]
async fn show_by_slug(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Page>, AppError> {
    PageRepository::new(state.pool())
        .get_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("page '{slug}'")))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Json(body): Json<PageInput>,
) -> Result<(StatusCode, Json<Page>), AppError> {
    let draft = body.into_draft()?;
    let page = PageRepository::new(state.pool()).create(&draft).await?;
    tracing::info!(page_id = %page.id, slug = %page.slug, "Page created");
    Ok((StatusCode::CREATED, Json(page)))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<PageId>,
    Json(body): Json<PageInput>,
) -> Result<Json<Page>, AppError> {
    let draft = body.into_draft()?;
    Ok(Json(PageRepository::new(state.pool()).update(id, &draft).await?))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn publish(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> Result<Json<Page>, AppError> {
    let page = PageRepository::new(state.pool())
        .set_status(id, PageStatus::Published)
        .await?;
    tracing::info!(page_id = %id, "Page published");
    Ok(Json(page))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn unpublish(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> Result<Json<Page>, AppError> {
    Ok(Json(
        PageRepository::new(state.pool())
            .set_status(id, PageStatus::Draft)
            .await?,
    ))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn destroy(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<PageId>,
) -> Result<StatusCode, AppError> {
    PageRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
