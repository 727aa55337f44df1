use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use bizhub_core::error::CoreError;
use serde_json::json;

use crate::auth::AuthError;

/// Body message shared by every 401 so failures cannot be told apart.
pub const UNAUTHORIZED_MESSAGE: &str = "Invalid or expired credentials";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`AuthError`].
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `bizhub_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An authentication or session outcome.
    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- CoreError variants ---
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    tracing::debug!(reason = %msg, "Request not authenticated");
                    (
                        StatusCode::UNAUTHORIZED,
                        "UNAUTHORIZED",
                        UNAUTHORIZED_MESSAGE.to_string(),
                    )
                }
            },

            // --- Authentication outcomes ---
            AppError::Auth(auth) => classify_auth_error(*auth),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map an [`AuthError`] to an HTTP status, error code, and message.
///
/// - Credential, token and session failures share one 401 response.
/// - A deactivated account is a distinct 403.
/// - Storage failures are 503 with a sanitized message.
fn classify_auth_error(err: AuthError) -> (StatusCode, &'static str, String) {
    match err {
        AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::InvalidSession => (
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            UNAUTHORIZED_MESSAGE.to_string(),
        ),
        AuthError::AccountDeactivated => (
            StatusCode::FORBIDDEN,
            "ACCOUNT_DEACTIVATED",
            "Account is deactivated".to_string(),
        ),
        AuthError::StorageFailure => (
            StatusCode::SERVICE_UNAVAILABLE,
            "STORAGE_UNAVAILABLE",
            "Service temporarily unavailable".to_string(),
        ),
        AuthError::TokenIssuanceFailure => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "An internal error occurred".to_string(),
        ),
    }
}
