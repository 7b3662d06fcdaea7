//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Session layer (tower-sessions with `PostgreSQL` store)
//! 4. Auth extractors on individual handlers

pub mod auth;
pub mod session;

pub use auth::{RequireAdminAuth, RequireSuperAdmin, RequireWriteAccess};
pub use session::{SESSION_COOKIE_NAME, create_session_layer, create_session_store};
