//! Abandoned cart API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::CartId;

use crate::{
    db::CartRepository,
    error::AppError,
    middleware::{RequireAdminAuth, RequireWriteAccess},
    models::{AbandonedCart, AbandonedCartStats},
    state::AppState,
};

/// Longest accepted inactivity window (one year).
const MAX_HOURS: i32 = 24 * 365;

/// Build the carts router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/carts/abandoned", get(abandoned))
        .route("/api/carts/abandoned/stats", get(stats))
        .route("/api/carts/{id}/recovered", post(recovered))
        .route("/api/carts/{id}", delete(destroy))
}

/// Abandoned cart query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct AbandonedQuery {
    /// Inactivity window; defaults to the configured value.
    pub hours: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl AbandonedQuery {
    fn hours(&self, default_hours: i32) -> Result<i32, AppError> {
        match self.hours {
            None => Ok(default_hours),
            Some(h) if (1..=MAX_HOURS).contains(&h) => Ok(h),
            Some(h) => Err(AppError::BadRequest(format!(
                "hours must be between 1 and {MAX_HOURS}, got {h}"
            ))),
        }
    }
}

#[instrument(skip(_admin, state))]
async fn abandoned(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<AbandonedQuery>,
) -> Result<Json<Vec<AbandonedCart>>, AppError> {
    let hours = query.hours(state.config().abandoned_cart_hours)?;
    let (limit, offset) = crate::db::page_bounds(query.page, query.per_page);
    let carts = CartRepository::new(state.pool())
        .list_abandoned(hours, limit, offset)
        .await?;
    Ok(Json(carts))
}

#[instrument(skip(_admin, state))]
async fn stats(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<AbandonedQuery>,
) -> Result<Json<AbandonedCartStats>, AppError> {
    let hours = query.hours(state.config().abandoned_cart_hours)?;
    Ok(Json(
        CartRepository::new(state.pool()).abandoned_stats(hours).await?,
    ))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn recovered(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CartId>,
) -> Result<StatusCode, AppError> {
    CartRepository::new(state.pool()).mark_recovered(id).await?;
    tracing::info!(cart_id = %id, "Cart marked recovered");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn destroy(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CartId>,
) -> Result<StatusCode, AppError> {
    CartRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
