//! Refund workflow API.
//!
//! Refunds move `pending → approved → processed`, or `pending → rejected`.
//! Processing updates the order status from the processed total.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{OrderId, RefundId, RefundStatus};

use super::{Paginated, clean, required};
use crate::{
    db::RefundRepository,
    error::AppError,
    middleware::{RequireAdminAuth, RequireWriteAccess},
    models::{Refund, RefundDraft},
    state::AppState,
};

/// Build the refunds router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/refunds", get(list).post(create))
        .route("/api/refunds/{id}", get(show))
        .route("/api/refunds/{id}/approve", post(approve))
        .route("/api/refunds/{id}/reject", post(reject))
        .route("/api/refunds/{id}/process", post(process))
}

/// Refund listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct RefundQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<RefundStatus>,
}

/// New refund body.
#[derive(Debug, Deserialize)]
pub struct RefundInput {
    pub order_id: OrderId,
    pub amount: Decimal,
    pub reason: String,
    pub note: Option<String>,
}

/// Optional note attached to a status change.
#[derive(Debug, Default, Deserialize)]
pub struct TransitionInput {
    pub note: Option<String>,
}

#[instrument(skip(_admin, state))]
async fn list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<RefundQuery>,
) -> Result<Json<Paginated<Refund>>, AppError> {
    let bounds = crate::db::page_bounds(query.page, query.per_page);
    let (refunds, total) = RefundRepository::new(state.pool())
        .list(query.status, bounds.0, bounds.1)
        .await?;
    Ok(Json(Paginated::new(refunds, total, bounds)))
}

#[instrument(skip(_admin, state))]
async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<RefundId>,
) -> Result<Json<Refund>, AppError> {
    RefundRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("refund {id}")))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Json(body): Json<RefundInput>,
) -> Result<(StatusCode, Json<Refund>), AppError> {
    let draft = RefundDraft {
        order_id: body.order_id,
        amount: body.amount,
        reason: required("Reason", &body.reason)?,
        note: clean(body.note),
    };
    let refund = RefundRepository::new(state.pool()).create(&draft).await?;
    tracing::info!(
        refund_id = %refund.id,
        order_id = %refund.order_id,
        amount = %refund.amount,
        "Refund requested"
    );
    Ok((StatusCode::CREATED, Json(refund)))
}

async fn transition(
    state: &AppState,
    id: RefundId,
    next: RefundStatus,
    body: Option<TransitionInput>,
) -> Result<Json<Refund>, AppError> {
    let note = body.and_then(|b| clean(b.note));
    let refund = RefundRepository::new(state.pool())
        .transition(id, next, note.as_deref())
        .await?;
    tracing::info!(refund_id = %id, status = %refund.status, "Refund status changed");
    Ok(Json(refund))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn approve(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<RefundId>,
    body: Option<Json<TransitionInput>>,
) -> Result<Json<Refund>, AppError> {
    transition(&state, id, RefundStatus::Approved, body.map(|Json(b)| b)).await
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn reject(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<RefundId>,
    body: Option<Json<TransitionInput>>,
) -> Result<Json<Refund>, AppError> {
    transition(&state, id, RefundStatus::Rejected, body.map(|Json(b)| b)).await
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn process(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<RefundId>,
    body: Option<Json<TransitionInput>>,
) -> Result<Json<Refund>, AppError> {
    transition(&state, id, RefundStatus::Processed, body.map(|Json(b)| b)).await
}
