//! User entity model and DTOs.

use bizhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// User row from the `users` table, limited to the columns the
/// authentication core reads.
///
/// Contains the password hash -- NEVER serialize this to API responses directly.
/// Use [`UserResponse`] for external-facing output.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub email: String,
    pub is_active: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            is_active: user.is_active,
        }
    }
}

/// Input for [`UserRepo::create`](crate::repositories::UserRepo::create).
///
/// Accounts are provisioned by the user-management service; this exists to
/// seed fixtures and local databases.
#[derive(Debug)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
}
