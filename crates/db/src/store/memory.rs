//! In-memory stores with the same semantics as the PostgreSQL ones.
//!
//! State lives behind a [`tokio::sync::RwLock`]; clocks are read with
//! [`Utc::now`] where PostgreSQL would use `NOW()`.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bizhub_core::types::{DbId, Timestamp};
use chrono::Utc;
use tokio::sync::RwLock;

use super::{SessionStore, StoreError, UserDirectory};
use crate::models::session::{ClientMeta, UserSession};
use crate::models::user::User;

#[derive(Default)]
struct SessionTable {
    next_id: DbId,
    rows: BTreeMap<DbId, UserSession>,
}

/// [`SessionStore`] kept entirely in process memory.
#[derive(Default)]
pub struct MemorySessionStore {
    table: RwLock<SessionTable>,
    fail_finalize: AtomicBool,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `finalize` call fail with a backend error.
    pub fn set_fail_finalize(&self, fail: bool) {
        self.fail_finalize.store(fail, Ordering::SeqCst);
    }

    /// Fetch a row in any state.
    pub async fn get(&self, session_id: DbId) -> Option<UserSession> {
        self.table.read().await.rows.get(&session_id).cloned()
    }

    /// Number of rows in any state.
    pub async fn len(&self) -> usize {
        self.table.read().await.rows.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(
        &self,
        user_id: DbId,
        meta: &ClientMeta,
        placeholder_expires_at: Timestamp,
    ) -> Result<DbId, StoreError> {
        let now = Utc::now();
        let mut table = self.table.write().await;
        table.next_id += 1;
        let id = table.next_id;
        table.rows.insert(
            id,
            UserSession {
                id,
                user_id,
                token_hash: None,
                issued_at: None,
                expires_at: placeholder_expires_at,
                revoked_at: None,
                ip_address: meta.ip_address.clone(),
                user_agent: meta.user_agent.clone(),
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn finalize(
        &self,
        session_id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<bool, StoreError> {
        if self.fail_finalize.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("injected finalize failure".into()));
        }

        let now = Utc::now();
        let mut table = self.table.write().await;
        if table
            .rows
            .values()
            .any(|row| row.token_hash.as_deref() == Some(token_hash))
        {
            return Err(StoreError::Backend(
                "duplicate value violates uq_user_sessions_token_hash".into(),
            ));
        }

        match table.rows.get_mut(&session_id) {
            Some(row) if row.is_provisional() && row.revoked_at.is_none() && row.expires_at > now => {
                row.token_hash = Some(token_hash.to_string());
                row.issued_at = Some(now);
                row.expires_at = expires_at;
                row.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn lookup(
        &self,
        session_id: DbId,
        user_id: DbId,
    ) -> Result<Option<UserSession>, StoreError> {
        let now = Utc::now();
        let table = self.table.read().await;
        Ok(table
            .rows
            .get(&session_id)
            .filter(|row| row.user_id == user_id && row.is_usable_at(now))
            .cloned())
    }

    async fn list_active(&self, user_id: DbId) -> Result<Vec<UserSession>, StoreError> {
        let now = Utc::now();
        let table = self.table.read().await;
        let mut rows: Vec<UserSession> = table
            .rows
            .values()
            .filter(|row| row.user_id == user_id && row.is_usable_at(now))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.issued_at.cmp(&a.issued_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn revoke(&self, session_id: DbId, user_id: DbId) -> Result<bool, StoreError> {
        let now = Utc::now();
        let mut table = self.table.write().await;
        match table.rows.get_mut(&session_id) {
            Some(row) if row.user_id == user_id && row.revoked_at.is_none() => {
                row.revoked_at = Some(now);
                row.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all(&self, user_id: DbId, except: Option<DbId>) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut table = self.table.write().await;
        let mut revoked = 0;
        for row in table.rows.values_mut() {
            if row.user_id == user_id && row.revoked_at.is_none() && Some(row.id) != except {
                row.revoked_at = Some(now);
                row.updated_at = now;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn delete(&self, session_id: DbId) -> Result<bool, StoreError> {
        Ok(self.table.write().await.rows.remove(&session_id).is_some())
    }

    async fn purge_expired_or_revoked(&self) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|_, row| !row.is_purgeable_at(now));
        Ok((before - table.rows.len()) as u64)
    }
}

#[derive(Default)]
struct UserTable {
    next_id: DbId,
    rows: HashMap<DbId, User>,
}

/// [`UserDirectory`] kept in process memory, with the writes tests need.
#[derive(Default)]
pub struct MemoryUserDirectory {
    table: RwLock<UserTable>,
}

impl MemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an active user with an already-hashed password.
    pub async fn insert(&self, email: &str, password_hash: &str) -> User {
        let now = Utc::now();
        let mut table = self.table.write().await;
        table.next_id += 1;
        let user = User {
            id: table.next_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(user.id, user.clone());
        user
    }

    /// Flip the active flag. Returns `false` if the user does not exist.
    pub async fn set_active(&self, user_id: DbId, active: bool) -> bool {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&user_id) {
            Some(user) => {
                user.is_active = active;
                user.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Remove a user entirely.
    pub async fn remove(&self, user_id: DbId) -> bool {
        self.table.write().await.rows.remove(&user_id).is_some()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(identifier))
            .cloned())
    }

    async fn find_by_id(&self, user_id: DbId) -> Result<Option<User>, StoreError> {
        Ok(self.table.read().await.rows.get(&user_id).cloned())
    }
}
