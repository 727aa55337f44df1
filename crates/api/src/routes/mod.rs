pub mod auth;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/login                 login (public)
/// /auth/logout                revoke current session (requires auth)
/// /auth/logout-all            revoke other sessions (requires auth)
/// /auth/me                    current user + session (requires auth)
/// /auth/sessions              live sessions of the caller (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/auth", auth::router())
}
