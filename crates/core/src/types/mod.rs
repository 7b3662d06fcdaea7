//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod media;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use media::{MAX_UPLOAD_BYTES, MediaKind, MediaKindError};
pub use price::{CurrencyCode, Price, round_money};
pub use slug::{Slug, SlugError};
pub use status::*;
