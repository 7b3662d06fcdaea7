//! Emporium Admin library.
//!
//! This crate provides the admin console as a library so the server binary,
//! the CLI and the integration tests share one implementation.
//!
//! # Security
//!
//! This crate has full write access to the store database and to the media
//! bucket. Data import is restricted to super admins.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;

use axum::Router;

use state::AppState;

/// The API router without session or tracing layers.
pub fn app() -> Router<AppState> {
    routes::routes()
}
