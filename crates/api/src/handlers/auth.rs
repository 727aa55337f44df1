//! Handlers for the `/auth` resource (login, logout, session listing).

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use bizhub_core::error::CoreError;
use bizhub_core::types::{DbId, Timestamp};
use bizhub_db::models::session::{ClientMeta, UserSession};
use bizhub_db::models::user::UserResponse;
use serde::{Deserialize, Serialize};

use crate::auth::LoginOutcome;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Longest user-agent string persisted with a session.
const MAX_USER_AGENT_LEN: usize = 512;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/logout-all`.
#[derive(Debug, Deserialize)]
pub struct LogoutAllRequest {
    /// Keep the session making this request signed in (default: `true`).
    #[serde(default = "default_keep_current")]
    pub keep_current: bool,
}

fn default_keep_current() -> bool {
    true
}

/// Response body for `POST /auth/logout-all`.
#[derive(Debug, Serialize)]
pub struct LogoutAllResponse {
    pub revoked: u64,
}

/// Response body for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub session: SessionInfo,
}

/// One session as shown to its owner.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub id: DbId,
    pub issued_at: Option<Timestamp>,
    pub expires_at: Timestamp,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Whether this is the session making the request.
    pub current: bool,
}

impl SessionInfo {
    fn from_row(session: &UserSession, current_id: DbId) -> Self {
        Self {
            id: session.id,
            issued_at: session.issued_at,
            expires_at: session.expires_at,
            ip_address: session.ip_address.clone(),
            user_agent: session.user_agent.clone(),
            current: session.id == current_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/login
///
/// Authenticate with email + password. Returns the bearer token, its session
/// id, and its expiry.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<LoginOutcome>> {
    if input.email.trim().is_empty() || input.password.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "email and password are required".into(),
        )));
    }

    let outcome = state
        .auth
        .login(input.email.trim(), &input.password, client_meta(&headers))
        .await?;

    Ok(Json(outcome))
}

/// POST /api/v1/auth/logout
///
/// Revoke the session the token belongs to. Returns 204 No Content, also
/// when the session was already revoked.
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> AppResult<StatusCode> {
    state.auth.logout(&auth_user.identity).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/logout-all
///
/// Revoke every session of the caller, keeping the current one unless
/// `keep_current` is `false`. The body is optional.
pub async fn logout_all(
    State(state): State<AppState>,
    auth_user: AuthUser,
    input: Option<Json<LogoutAllRequest>>,
) -> AppResult<Json<LogoutAllResponse>> {
    let keep_current = input.map_or(true, |Json(body)| body.keep_current);
    let except = keep_current.then(|| auth_user.session_id());
    let revoked = state.auth.logout_all(auth_user.user_id(), except).await?;
    Ok(Json(LogoutAllResponse { revoked }))
}

/// GET /api/v1/auth/me
///
/// The authenticated user and the session the token belongs to.
pub async fn me(auth_user: AuthUser) -> AppResult<Json<DataResponse<MeResponse>>> {
    Ok(Json(DataResponse {
        data: MeResponse {
            user: UserResponse::from(&auth_user.user),
            session: SessionInfo::from_row(&auth_user.session, auth_user.session_id()),
        },
    }))
}

/// GET /api/v1/auth/sessions
///
/// The caller's live sessions, most recent first.
pub async fn list_sessions(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<SessionInfo>>>> {
    let sessions = state.auth.list_sessions(auth_user.user_id()).await?;
    let current = auth_user.session_id();
    Ok(Json(DataResponse {
        data: sessions
            .iter()
            .map(|s| SessionInfo::from_row(s, current))
            .collect(),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Capture origin address and agent string from request headers.
///
/// The address is the first hop of `X-Forwarded-For`, as set by the
/// reverse proxy in front of the API.
fn client_meta(headers: &HeaderMap) -> ClientMeta {
    let ip_address = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string);

    let user_agent = headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.chars().take(MAX_USER_AGENT_LEN).collect());

    ClientMeta {
        ip_address,
        user_agent,
    }
}
