//! Coupon management and validation API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use emporium_core::CouponId;

use super::{ListQuery, Paginated};
use crate::{
    db::CouponRepository,
    error::AppError,
    middleware::{RequireAdminAuth, RequireWriteAccess},
    models::Coupon,
    services::coupons::{CouponCheck, CouponInput, evaluate, normalize_code},
    state::AppState,
};

/// Build the coupons router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/coupons", get(list).post(create))
        .route("/api/coupons/validate", post(validate))
        .route("/api/coupons/{id}", get(show).put(update).delete(destroy))
}

/// Coupon validation body.
#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub code: String,
    pub order_total: Decimal,
}

#[instrument(skip(_admin, state))]
async fn list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Paginated<Coupon>>, AppError> {
    let bounds = query.bounds();
    let (coupons, total) = CouponRepository::new(state.pool())
        .list(query.search.as_deref(), bounds.0, bounds.1)
        .await?;
    Ok(Json(Paginated::new(coupons, total, bounds)))
}

#[instrument(skip(_admin, state))]
async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
) -> Result<Json<Coupon>, AppError> {
    CouponRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("coupon {id}")))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Json(body): Json<CouponInput>,
) -> Result<(StatusCode, Json<Coupon>), AppError> {
    let draft = body.into_draft().map_err(AppError::BadRequest)?;
    let coupon = CouponRepository::new(state.pool()).create(&draft).await?;
    tracing::info!(coupon_id = %coupon.id, code = %coupon.code, "Coupon created");
    Ok((StatusCode::CREATED, Json(coupon)))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
    Json(body): Json<CouponInput>,
) -> Result<Json<Coupon>, AppError> {
    let draft = body.into_draft().map_err(AppError::BadRequest)?;
    Ok(Json(
        CouponRepository::new(state.pool()).update(id, &draft).await?,
    ))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn destroy(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<CouponId>,
) -> Result<StatusCode, AppError> {
    CouponRepository::new(state.pool()).delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check a code against an order total without redeeming it.
#[instrument(skip(_admin, state, body), fields(code = %body.code))]
async fn validate(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<CouponCheck>, AppError> {
    if body.order_total < Decimal::ZERO {
        return Err(AppError::BadRequest(
            "Order total cannot be negative".to_owned(),
        ));
    }

    let code = normalize_code(&body.code);
    let check = match CouponRepository::new(state.pool()).get_by_code(&code).await? {
        Some(coupon) => evaluate(&coupon, body.order_total, Utc::now()),
        None => CouponCheck {
            code,
            valid: false,
            discount: Decimal::ZERO,
            free_shipping: false,
            reason: Some("Coupon not found".to_owned()),
        },
    };
    Ok(Json(check))
}
