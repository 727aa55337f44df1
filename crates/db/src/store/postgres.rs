//! PostgreSQL-backed stores delegating to the repositories.

use async_trait::async_trait;
use bizhub_core::types::{DbId, Timestamp};

use super::{SessionStore, StoreError, UserDirectory};
use crate::models::session::{ClientMeta, UserSession};
use crate::models::user::User;
use crate::repositories::{SessionRepo, UserRepo};
use crate::DbPool;

/// [`SessionStore`] over the `user_sessions` table.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: DbPool,
}

impl PgSessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(
        &self,
        user_id: DbId,
        meta: &ClientMeta,
        placeholder_expires_at: Timestamp,
    ) -> Result<DbId, StoreError> {
        Ok(SessionRepo::create_provisional(&self.pool, user_id, meta, placeholder_expires_at).await?)
    }

    async fn finalize(
        &self,
        session_id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<bool, StoreError> {
        Ok(SessionRepo::finalize(&self.pool, session_id, token_hash, expires_at).await?)
    }

    async fn lookup(
        &self,
        session_id: DbId,
        user_id: DbId,
    ) -> Result<Option<UserSession>, StoreError> {
        Ok(SessionRepo::find_active(&self.pool, session_id, user_id).await?)
    }

    async fn list_active(&self, user_id: DbId) -> Result<Vec<UserSession>, StoreError> {
        Ok(SessionRepo::list_active_for_user(&self.pool, user_id).await?)
    }

    async fn revoke(&self, session_id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        Ok(SessionRepo::revoke(&self.pool, session_id, user_id).await?)
    }

    async fn revoke_all(&self, user_id: DbId, except: Option<DbId>) -> Result<u64, StoreError> {
        Ok(SessionRepo::revoke_all_for_user(&self.pool, user_id, except).await?)
    }

    async fn delete(&self, session_id: DbId) -> Result<bool, StoreError> {
        Ok(SessionRepo::delete(&self.pool, session_id).await?)
    }

    async fn purge_expired_or_revoked(&self) -> Result<u64, StoreError> {
        Ok(SessionRepo::cleanup_expired(&self.pool).await?)
    }
}

/// [`UserDirectory`] over the `users` table.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: DbPool,
}

impl PgUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_email(&self.pool, identifier).await?)
    }

    async fn find_by_id(&self, user_id: DbId) -> Result<Option<User>, StoreError> {
        Ok(UserRepo::find_by_id(&self.pool, user_id).await?)
    }
}
