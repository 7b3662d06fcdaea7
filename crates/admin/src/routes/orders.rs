//! Order read API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use serde::Deserialize;
use tracing::instrument;

use emporium_core::{OrderId, OrderStatus};

use super::Paginated;
use crate::{
    db::OrderRepository,
    error::AppError,
    middleware::RequireAdminAuth,
    models::{Order, OrderDetail},
    state::AppState,
};

/// Build the orders router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/orders", get(list))
        .route("/api/orders/{id}", get(show))
}

/// Order listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<OrderStatus>,
}

#[instrument(skip(_admin, state))]
async fn list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Paginated<Order>>, AppError> {
    let bounds = crate::db::page_bounds(query.page, query.per_page);
    let (orders, total) = OrderRepository::new(state.pool())
        .list(query.status, bounds.0, bounds.1)
        .await?;
    Ok(Json(Paginated::new(orders, total, bounds)))
}

#[instrument(skip(_admin, state))]
async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetail>, AppError> {
    OrderRepository::new(state.pool())
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("order {id}")))
}
