//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use bizhub_core::error::CoreError;
use bizhub_core::types::DbId;
use bizhub_db::models::session::UserSession;
use bizhub_db::models::user::User;

use crate::auth::{AuthenticatedSession, SessionIdentity};
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated caller extracted from the `Authorization: Bearer <token>` header.
///
/// Use this as an extractor parameter in any handler that requires authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id(), "handling request");
///     Ok(Json(()))
/// }
/// ```
///
/// The validated identity is cached in the request extensions, so several
/// extractors on one request validate the token only once.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Ids proven by the token; the only input accepted by logout.
    pub identity: SessionIdentity,
    /// The owning user, re-read during validation.
    pub user: User,
    /// The live session row.
    pub session: UserSession,
}

impl AuthUser {
    pub fn user_id(&self) -> DbId {
        self.identity.user_id()
    }

    pub fn session_id(&self) -> DbId {
        self.identity.session_id()
    }
}

impl From<AuthenticatedSession> for AuthUser {
    fn from(auth: AuthenticatedSession) -> Self {
        Self {
            identity: auth.identity,
            user: auth.user,
            session: auth.session,
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let token = bearer_token(parts)?;
        let user = AuthUser::from(state.auth.validate_token(token).await?);
        parts.extensions.insert(user.clone());
        Ok(user)
    }
}

/// Pull the raw token out of `Authorization: Bearer <token>`.
fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Missing Authorization header".into(),
            ))
        })?;

    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })
}
