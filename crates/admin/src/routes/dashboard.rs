//! Dashboard overview API.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::instrument;

use crate::{
    db::{
        DashboardRepository,
        dashboard::DashboardCounts,
        settings::{self, LAST_IMPORT, LAST_MEDIA_SYNC},
    },
    error::AppError,
    middleware::RequireAdminAuth,
    models::CurrentAdmin,
    state::AppState,
};

/// Build the dashboard router.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/dashboard", get(index))
}

/// Dashboard payload.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub admin: CurrentAdmin,
    pub counts: DashboardCounts,
    /// Abandoned cart window used for `counts.abandoned_carts`.
    pub abandoned_cart_hours: i32,
    /// Whether blob storage is configured (media sync available).
    pub blob_storage: bool,
    /// Summary of the most recent media sync, if any.
    pub last_media_sync: Option<JsonValue>,
    /// Report of the most recent fixture import, if any.
    pub last_import: Option<JsonValue>,
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn index(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let hours = state.config().abandoned_cart_hours;
    let counts = DashboardRepository::new(state.pool()).counts(hours).await?;
    let last_media_sync = settings::get_setting(state.pool(), LAST_MEDIA_SYNC).await?;
    let last_import = settings::get_setting(state.pool(), LAST_IMPORT).await?;

    Ok(Json(DashboardResponse {
        admin,
        counts,
        abandoned_cart_hours: hours,
        blob_storage: state.blob().is_some(),
        last_media_sync,
        last_import,
    }))
}
