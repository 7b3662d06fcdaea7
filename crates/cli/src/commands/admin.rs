//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! em-cli admin create -e admin@example.com -n "Admin Name" -r super_admin -p '...'
//! ```
//!
//! The password can also be supplied through `ADMIN_PASSWORD` to keep it
//! out of shell history.

use emporium_admin::services::{AdminAuthService, AuthError};
use emporium_core::AdminRole;
use thiserror::Error;

use super::{ConnectError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// Invalid role.
    #[error("Invalid role: {0}. Valid roles: super_admin, admin, viewer")]
    InvalidRole(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Create a new admin user with a hashed password.
///
/// # Errors
///
/// Returns `AdminError` for an unknown role, an invalid email or weak
/// password, an existing account, or a database failure.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: &str,
) -> Result<(), AdminError> {
    let role: AdminRole = role
        .parse()
        .map_err(|_| AdminError::InvalidRole(role.to_owned()))?;

    let pool = connect().await?;

    tracing::info!("Creating admin user: {} ({})", email, role);
    let user = AdminAuthService::new(&pool)
        .create_admin(email, name, role, password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}
