//! Storage seams used by the authentication core.
//!
//! [`SessionStore`] owns the session rows; [`UserDirectory`] is the narrow
//! read interface onto the external user-profile store. Both come in a
//! PostgreSQL flavour ([`postgres`]) and an in-memory flavour ([`memory`])
//! for tests and local development.

use std::time::Duration;

use async_trait::async_trait;
use bizhub_core::types::{DbId, Timestamp};

use crate::models::session::{ClientMeta, UserSession};
use crate::models::user::User;

pub mod memory;
pub mod postgres;

pub use memory::{MemorySessionStore, MemoryUserDirectory};
pub use postgres::{PgSessionStore, PgUserDirectory};

/// Failure of a storage backend. Detail is for logs only.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("storage operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Persistence for session rows.
///
/// "Live" below means: token hash bound, not revoked, expiry in the future.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a provisional row and return its id.
    async fn create(
        &self,
        user_id: DbId,
        meta: &ClientMeta,
        placeholder_expires_at: Timestamp,
    ) -> Result<DbId, StoreError>;

    /// Bind the token hash and real expiry. `false` if no bindable
    /// provisional row with that id exists.
    async fn finalize(
        &self,
        session_id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<bool, StoreError>;

    /// The live row for `(session_id, user_id)`, if any.
    async fn lookup(
        &self,
        session_id: DbId,
        user_id: DbId,
    ) -> Result<Option<UserSession>, StoreError>;

    /// All live rows of a user, most recently issued first.
    async fn list_active(&self, user_id: DbId) -> Result<Vec<UserSession>, StoreError>;

    /// Set the revocation timestamp. `false` when there was nothing to revoke.
    async fn revoke(&self, session_id: DbId, user_id: DbId) -> Result<bool, StoreError>;

    /// Revoke every non-revoked row of a user except `except`.
    async fn revoke_all(&self, user_id: DbId, except: Option<DbId>) -> Result<u64, StoreError>;

    /// Hard-delete a row regardless of state.
    async fn delete(&self, session_id: DbId) -> Result<bool, StoreError>;

    /// Delete every expired or revoked row and return the count.
    async fn purge_expired_or_revoked(&self) -> Result<u64, StoreError>;
}

/// Read-only view of the user-profile store.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Look up a user by login identifier (email, case-insensitive).
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, StoreError>;

    /// Look up a user by id, used to re-check the active flag.
    async fn find_by_id(&self, user_id: DbId) -> Result<Option<User>, StoreError>;
}
