//! Product and variation management API.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use emporium_core::{BrandId, CategoryId, ProductId, ProductStatus, Slug, VariationId};

use super::{Paginated, clean, required};
use crate::{
    db::ProductRepository,
    error::AppError,
    middleware::{RequireAdminAuth, RequireWriteAccess},
    models::{Product, ProductDetail, ProductDraft, ProductFilter, ProductVariation, VariationDraft},
    state::AppState,
};

/// Build the products router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/products", get(list).post(create))
        .route("/api/products/{id}", get(show).put(update).delete(destroy))
        .route("/api/products/{id}/variations", post(create_variation))
        .route(
            "/api/products/{id}/variations/{variation_id}",
            put(update_variation).delete(delete_variation),
        )
}

/// Product listing query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
}

/// Product create/update body.
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub slug: Option<String>,
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub description: Option<String>,
    #[serde(default)]
    pub status: ProductStatus,
    pub base_price: Decimal,
    pub image_key: Option<String>,
    pub external_id: Option<Uuid>,
}

impl ProductInput {
    fn into_draft(self) -> Result<ProductDraft, AppError> {
        let name = required("Name", &self.name)?;
        if self.base_price < Decimal::ZERO {
            return Err(AppError::BadRequest(
                "Base price cannot be negative".to_owned(),
            ));
        }
        let slug = Slug::from_input(self.slug.as_deref(), &name)?;
        Ok(ProductDraft {
            brand_id: self.brand_id,
            category_id: self.category_id,
            name,
            slug,
            description: clean(self.description),
            status: self.status,
            base_price: self.base_price,
            image_key: clean(self.image_key),
            external_id: self.external_id,
        })
    }
}

/// Variation create/update body.
#[derive(Debug, Deserialize)]
pub struct VariationInput {
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub stock: i32,
}

impl VariationInput {
    fn into_draft(self) -> Result<VariationDraft, AppError> {
        let sku = required("SKU", &self.sku)?;
        let name = required("Name", &self.name)?;
        if self.price < Decimal::ZERO {
            return Err(AppError::BadRequest("Price cannot be negative".to_owned()));
        }
        if self.stock < 0 {
            return Err(AppError::BadRequest("Stock cannot be negative".to_owned()));
        }
        Ok(VariationDraft {
            sku,
            name,
            price: self.price,
            stock: self.stock,
        })
    }
}

#[instrument(skip(_admin, state))]
async fn list(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Paginated<Product>>, AppError> {
    let bounds = crate::db::page_bounds(query.page, query.per_page);
    let filter = ProductFilter {
        brand_id: query.brand_id,
        category_id: query.category_id,
        status: query.status,
        search: query.search,
    };
    let (products, total) = ProductRepository::new(state.pool())
        .list(&filter, bounds.0, bounds.1)
        .await?;
    Ok(Json(Paginated::new(products, total, bounds)))
}

#[instrument(skip(_admin, state))]
async fn show(
    RequireAdminAuth(_admin): RequireAdminAuth,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<ProductDetail>, AppError> {
    ProductRepository::new(state.pool())
        .get_detail(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("product {id}")))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn create(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Json(body): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let draft = body.into_draft()?;
    let product = ProductRepository::new(state.pool()).create(&draft).await?;
    tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn update(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductInput>,
) -> Result<Json<Product>, AppError> {
    let draft = body.into_draft()?;
    Ok(Json(
        ProductRepository::new(state.pool()).update(id, &draft).await?,
    ))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn destroy(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, AppError> {
    ProductRepository::new(state.pool()).delete(id).await?;
    tracing::info!(product_id = %id, "Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn create_variation(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(body): Json<VariationInput>,
) -> Result<(StatusCode, Json<ProductVariation>), AppError> {
    let draft = body.into_draft()?;
    let repo = ProductRepository::new(state.pool());
    if repo.get(id).await?.is_none() {
        return Err(AppError::not_found(format!("product {id}")));
    }
    let variation = repo.create_variation(id, &draft).await?;
    Ok((StatusCode::CREATED, Json(variation)))
}

#[instrument(skip(admin, state, body), fields(admin_id = %admin.id))]
async fn update_variation(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path((id, variation_id)): Path<(ProductId, VariationId)>,
    Json(body): Json<VariationInput>,
) -> Result<Json<ProductVariation>, AppError> {
    let draft = body.into_draft()?;
    Ok(Json(
        ProductRepository::new(state.pool())
            .update_variation(id, variation_id, &draft)
            .await?,
    ))
}

#[instrument(skip(admin, state), fields(admin_id = %admin.id))]
async fn delete_variation(
    RequireWriteAccess(admin): RequireWriteAccess,
    State(state): State<AppState>,
    Path((id, variation_id)): Path<(ProductId, VariationId)>,
) -> Result<StatusCode, AppError> {
    ProductRepository::new(state.pool())
        .delete_variation(id, variation_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_input_defaults() {
        let input: ProductInput = serde_json::from_value(serde_json::json!({
            "name": "Jasmine Pearls",
            "base_price": "18.50"
        }))
        .unwrap();
        let draft = input.into_draft().unwrap();
        assert_eq!(draft.slug.as_str(), "jasmine-pearls");
        assert_eq!(draft.status, ProductStatus::Draft);
        assert_eq!(draft.base_price, Decimal::new(1850, 2));
    }

    #[test]
    fn test_negative_values_rejected() {
        let input: ProductInput = serde_json::from_value(serde_json::json!({
            "name": "x",
            "base_price": "-1"
        }))
        .unwrap();
        assert!(input.into_draft().is_err());

        let variation = VariationInput {
            sku: "X-1".into(),
            name: "Small".into(),
            price: Decimal::ONE,
            stock: -2,
        };
        assert!(variation.into_draft().is_err());
    }
}
