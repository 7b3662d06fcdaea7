//! Emporium Core - Shared types library.
//!
//! This crate provides the domain vocabulary used by every Emporium component:
//! - `admin` - The administration console server (JSON API)
//! - `cli` - Command-line tools for migrations, export, import and media sync
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no database
//! access, no HTTP clients. Database encodings are gated behind the `postgres`
//! feature so the types can be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, statuses, emails, slugs, prices and media kinds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
