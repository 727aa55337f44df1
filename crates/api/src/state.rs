use std::sync::Arc;

use crate::auth::SessionLifecycleManager;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool. `None` when running over in-memory stores.
    pub pool: Option<bizhub_db::DbPool>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Authentication and session lifecycle core.
    pub auth: Arc<SessionLifecycleManager>,
}
