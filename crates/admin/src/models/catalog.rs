//! Catalog domain types: brands, taxonomy, products and variations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use emporium_core::{
    BrandId, CategoryId, CategoryLevel, ProductId, ProductStatus, Slug, VariationId,
};

/// A product brand.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    /// Storefront URL handle, unique across brands.
    pub url_handle: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated brand fields for create/update.
#[derive(Debug, Clone)]
pub struct BrandDraft {
    pub name: String,
    pub url_handle: Slug,
    pub description: Option<String>,
    pub logo_url: Option<String>,
}

/// A node in the department → type → subtype taxonomy.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub level: CategoryLevel,
    pub parent_id: Option<CategoryId>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated category fields for create/update.
#[derive(Debug, Clone)]
pub struct CategoryDraft {
    pub name: String,
    pub slug: Slug,
    pub level: CategoryLevel,
    pub parent_id: Option<CategoryId>,
    pub description: Option<String>,
}

impl CategoryDraft {
    /// Check that this category may sit under `parent`.
    ///
    /// Departments have no parent; every other level sits directly under
    /// the level above it.
    ///
    /// # Errors
    ///
    /// Returns a human-readable reason when the placement is invalid.
    pub fn check_parent(&self, parent: Option<&Category>) -> Result<(), String> {
        match (self.level, parent) {
            (CategoryLevel::Department, None) => Ok(()),
            (CategoryLevel::Department, Some(_)) => {
                Err("A department cannot have a parent category".to_owned())
            }
            (level, None) => Err(format!("A {level} category requires a parent")),
            (level, Some(parent)) if parent.level.child() == Some(level) => Ok(()),
            (level, Some(parent)) => match parent.level.child() {
                Some(expected) => Err(format!(
                    "A {level} cannot be placed under a {}; children of a {} must be a {expected}",
                    parent.level, parent.level
                )),
                None => Err(format!("A {} cannot have child categories", parent.level)),
            },
        }
    }
}

/// A category with its children, for tree rendering.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

impl CategoryNode {
    /// Assemble a forest from a flat list.
    ///
    /// Roots are categories without a parent (or whose parent is missing
    /// from the list). Siblings keep the order they had in `categories`.
    #[must_use]
    pub fn build_tree(categories: Vec<Category>) -> Vec<Self> {
        let ids: std::collections::HashSet<CategoryId> =
            categories.iter().map(|c| c.id).collect();
        let (roots, rest): (Vec<_>, Vec<_>) = categories
            .into_iter()
            .partition(|c| c.parent_id.is_none_or(|p| !ids.contains(&p)));

        let mut by_parent: std::collections::HashMap<CategoryId, Vec<Category>> =
            std::collections::HashMap::new();
        for category in rest {
            if let Some(parent) = category.parent_id {
                by_parent.entry(parent).or_default().push(category);
            }
        }

        roots
            .into_iter()
            .map(|root| Self::attach(root, &mut by_parent))
            .collect()
    }

    fn attach(
        category: Category,
        by_parent: &mut std::collections::HashMap<CategoryId, Vec<Category>>,
    ) -> Self {
        let children = by_parent
            .remove(&category.id)
            .unwrap_or_default()
            .into_iter()
            .map(|child| Self::attach(child, by_parent))
            .collect();
        Self { category, children }
    }
}

/// A product row, with brand and category names joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub brand_id: Option<BrandId>,
    pub brand_name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub category_name: Option<String>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub status: ProductStatus,
    pub base_price: Decimal,
    pub image_key: Option<String>,
    pub external_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product together with its variations.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub variations: Vec<ProductVariation>,
}

/// Validated product fields for create/update.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub status: ProductStatus,
    pub base_price: Decimal,
    pub image_key: Option<String>,
    pub external_id: Option<Uuid>,
}

/// Filters for product listing.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub brand_id: Option<BrandId>,
    pub category_id: Option<CategoryId>,
    pub status: Option<ProductStatus>,
    pub search: Option<String>,
}

/// A purchasable variant of a product (size, colour, ...).
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductVariation {
    pub id: VariationId,
    pub product_id: ProductId,
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated variation fields for create/update.
#[derive(Debug, Clone)]
pub struct VariationDraft {
    pub sku: String,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}
