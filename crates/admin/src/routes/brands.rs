//! Brand management API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{BrandId, Slug};

use super::{ListQuery, Paginated, clean, required};
use crate::{
    db::BrandRepository,
    error::AppError,
    middleware::{RequireAdminAuth, RequireWriteAccess},
    models::{Brand, BrandDraft},
    state::AppState,
};

/// Build the brands router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/brands", get(list).post(create))
        .route("/api/brands/{id}", get(show).put(update).delete(destroy))
}

/// Brand create/update body.
#[derive(Debug, Deserialize)]
pub struct BrandInput {
    pub name: String,
    /// Defaults to a slug of `name`.
    pub url_handle: Option<String>,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

impl BrandInput {
    fn into_draft(self) -> Result<BrandDraft, AppError> {
        let name = required("Name", &self.name)?;
        let url_handle = Slug::from_input(self.url_handle.as_deref(), &name)?;
        Ok(BrandDraft {
            name,
            url_handle,
            description: clean(self.description),
            logo_url: clean(self.logo_url),
        })
    }
}

#[instrument(skip(_admin, state))]
async fn list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Brand>>, AppError> {
    let bounds = query.bounds();
    let (brands, total) = BrandRepository::new(state.pool())
        .list(query.search.as_deref(), bounds.0, bounds.1)
        .await?;
    Ok(Json(Paginated::new(brands, total, bounds)))
}

#[instrument(skip(_admin, state))]
async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<BrandId>,
) -> Result<Json<Brand>, AppError> {
    BrandRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("brand {id}")))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Json(body): Json<BrandInput>,
) -> Result<(StatusCode, Json<Brand>), AppError> {
    let draft = body.into_draft()?;
    let brand = BrandRepository::new(state.pool()).create(&draft).await?;
    tracing::info!(brand_id = %brand.id, handle = %brand.url_handle, "Brand created");
    Ok((StatusCode::CREATED, Json(brand)))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<BrandId>,
    Json(body): Json<BrandInput>,
) -> Result<Json<Brand>, AppError> {
    let draft = body.into_draft()?;
    let brand = BrandRepository::new(state.pool()).update(id, &draft).await?;
    Ok(Json(brand))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn destroy(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<BrandId>,
) -> Result<StatusCode, AppError> {
    BrandRepository::new(state.pool()).delete(id).await?;
    tracing::info!(brand_id = %id, "Brand deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(name: &str, handle: Option<&str>) -> BrandInput {
        BrandInput {
            name: name.to_owned(),
            url_handle: handle.map(str::to_owned),
            description: Some("  ".to_owned()),
            logo_url: None,
        }
    }

    #[test]
    fn test_handle_defaults_to_name() {
        let draft = input("Blue Bottle Co.", None).into_draft().unwrap();
        assert_eq!(draft.url_handle.as_str(), "blue-bottle-co");
        assert_eq!(draft.description, None);
    }

    #[test]
    fn test_explicit_handle_validated() {
        assert!(input("Blue", Some("Not A Slug")).into_draft().is_err());
        let draft = input("Blue", Some("blue-two")).into_draft().unwrap();
        assert_eq!(draft.url_handle.as_str(), "blue-two");
    }

    #[test]
    fn test_name_required() {
        assert!(matches!(
            input("  ", None).into_draft(),
            Err(AppError::BadRequest(_))
        ));
    }
}
