/// Domain-level errors that are not specific to authentication.
///
/// Authentication outcomes have their own taxonomy in the API crate.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}
