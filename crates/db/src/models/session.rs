//! User session model and DTOs.

use bizhub_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `user_sessions` table.
///
/// `token_hash` and `issued_at` are `None` while the session is provisional,
/// i.e. before the bearer token embedding its id has been bound.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserSession {
    pub id: DbId,
    pub user_id: DbId,
    #[serde(skip_serializing)]
    pub token_hash: Option<String>,
    pub issued_at: Option<Timestamp>,
    pub expires_at: Timestamp,
    pub revoked_at: Option<Timestamp>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl UserSession {
    /// Whether the row still awaits its token binding.
    pub fn is_provisional(&self) -> bool {
        self.token_hash.is_none()
    }

    /// Whether the session can authenticate requests at `now`.
    ///
    /// The owning user's active flag is checked separately.
    pub fn is_usable_at(&self, now: Timestamp) -> bool {
        !self.is_provisional() && self.revoked_at.is_none() && now < self.expires_at
    }

    /// Whether the cleanup sweep may delete the row at `now`.
    pub fn is_purgeable_at(&self, now: Timestamp) -> bool {
        self.revoked_at.is_some() || self.expires_at <= now
    }
}

/// Client metadata captured at login.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}
