//! Password login and session endpoints.

use axum::{Json, Router, extract::State, http::StatusCode, routing::{get, post}};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::{
    error::{AppError, clear_sentry_user, set_sentry_user},
    middleware::auth::{RequireAdminAuth, clear_current_admin, set_current_admin},
    models::CurrentAdmin,
    services::AdminAuthService,
    state::AppState,
};

/// Build the auth router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Verify credentials and start a session.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>, AppError> {
    let user = match AdminAuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(email = %body.email, "Admin login failed");
            return Err(e.into());
        }
    };

    let admin = CurrentAdmin::from(user);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(admin.id.as_i32(), Some(admin.email.as_str()));
    tracing::info!(admin_id = %admin.id, "Admin logged in");

    Ok(Json(admin))
}

/// End the current session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode, AppError> {
    clear_current_admin(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// The logged-in admin.
pub async fn me(RequireAdminAuth(admin): RequireAdminAuth) -> Json<CurrentAdmin> {
    Json(admin)
}
