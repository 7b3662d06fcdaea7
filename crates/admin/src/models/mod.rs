//! Domain models for the admin console.
//!
//! Read models derive `sqlx::FromRow` and `Serialize` so repositories can
//! return them directly as JSON. `*Draft` types carry validated input for
//! create and update operations.

pub mod admin_user;
pub mod catalog;
pub mod content;
pub mod sales;
pub mod session;

pub use admin_user::{AdminRole, AdminUser};
pub use catalog::{
    Brand, BrandDraft, Category, CategoryDraft, CategoryNode, Product, ProductDetail,
    ProductDraft, ProductFilter, ProductVariation, VariationDraft,
};
pub use content::{Coupon, CouponDraft, Page, PageDraft};
pub use sales::{
    AbandonedCart, AbandonedCartStats, Order, OrderDetail, OrderItem, Refund, RefundDraft,
};
pub use session::{CurrentAdmin, keys as session_keys};
