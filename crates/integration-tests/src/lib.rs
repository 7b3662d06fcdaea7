//! Integration tests for Emporium.
//!
//! # Running Tests
//!
//! ```bash
//! # Library-level tests (no services needed)
//! cargo test -p emporium-integration-tests
//!
//! # HTTP tests against a running admin server
//! ADMIN_BASE_URL=http://localhost:3001 \
//! ADMIN_TEST_EMAIL=admin@example.com \
//! ADMIN_TEST_PASSWORD='...' \
//! cargo test -p emporium-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `admin_api` - HTTP tests against a live server (ignored by default)
//! - `data_manager` - Export rendering and table selection
//! - `media` - Local media library and sync planning

use reqwest::{Client, StatusCode};
use serde_json::json;

/// Base URL for the admin API (configurable via environment).
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_owned())
}

/// A client that keeps the session cookie between requests.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialized.
pub fn client() -> reqwest::Result<Client> {
    Client::builder().cookie_store(true).build()
}

/// Credentials for the test admin, from `ADMIN_TEST_EMAIL` and
/// `ADMIN_TEST_PASSWORD`.
#[must_use]
pub fn test_credentials() -> Option<(String, String)> {
    let email = std::env::var("ADMIN_TEST_EMAIL").ok()?;
    let password = std::env::var("ADMIN_TEST_PASSWORD").ok()?;
    Some((email, password))
}

/// Log `client` in with the given credentials and return the response status.
///
/// # Errors
///
/// Returns an error if the request cannot be sent.
pub async fn login(client: &Client, email: &str, password: &str) -> reqwest::Result<StatusCode> {
    let resp = client
        .post(format!("{}/auth/login", admin_base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    Ok(resp.status())
}
