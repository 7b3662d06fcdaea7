//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Email and password login (Argon2id)
//! - `coupons` - Coupon validation rules and discount evaluation
//! - `export` - Table export to JSON, CSV and XML
//! - `import` - Fixture import with lenient field coercion
//! - `media` - Local media library, uploads and blob sync

pub mod auth;
pub mod coupons;
pub mod export;
pub mod import;
pub mod media;

pub use auth::{AdminAuthService, AuthError};
pub use export::{ExportError, ExportFile, ExportFormat};
pub use import::{ImportError, ImportReport, TableFailure, TableReport};
pub use media::MediaError;
