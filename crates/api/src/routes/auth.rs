//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST /login       -> login
/// POST /logout      -> logout (requires auth)
/// POST /logout-all  -> logout_all (requires auth)
/// GET  /me          -> me (requires auth)
/// GET  /sessions    -> list_sessions (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/logout-all", post(auth::logout_all))
        .route("/me", get(auth::me))
        .route("/sessions", get(auth::list_sessions))
}
