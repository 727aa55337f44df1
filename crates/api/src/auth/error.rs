//! Caller-facing authentication outcomes.
//!
//! Variants are coarse: an unknown identifier and a wrong secret
//! are both [`AuthError::InvalidCredentials`], and every token defect is
//! [`AuthError::InvalidToken`]. Finer detail goes to the logs only.

use std::future::Future;
use std::time::Duration;

use bizhub_db::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is deactivated")]
    AccountDeactivated,

    #[error("invalid token")]
    InvalidToken,

    #[error("invalid session")]
    InvalidSession,

    #[error("session storage failure")]
    StorageFailure,

    #[error("token issuance failure")]
    TokenIssuanceFailure,
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Await a storage call under `limit`, collapsing any failure to
/// [`AuthError::StorageFailure`] after logging it.
///
/// Dropping the returned future drops the storage call with it.
pub(crate) async fn storage_call<T, F>(operation: &'static str, limit: Duration, call: F) -> AuthResult<T>
where
    F: Future<Output = Result<T, StoreError>>,
{
    let err = match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(err)) => err,
        Err(_) => StoreError::Timeout(limit),
    };
    tracing::error!(operation, error = %err, "Session storage operation failed");
    Err(AuthError::StorageFailure)
}
