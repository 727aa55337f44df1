//! Session lifecycle state machine.
//!
//! ```text
//! login ──► Provisional ──finalize──► Active ──logout──► Revoked ─┐
//!               │                       └──time────────► Expired ─┴─sweep──► Purged
//!               └─ any failure ──► compensating delete
//! ```
//!
//! A session row is written before its token exists because the token embeds
//! the session id. The provisional row carries a short placeholder expiry and
//! no token hash, so it can never authenticate a request and the cleanup
//! sweep removes it if the compensating delete itself is lost.

use std::sync::Arc;
use std::time::Duration;

use bizhub_core::types::{DbId, Timestamp};
use bizhub_db::models::session::{ClientMeta, UserSession};
use bizhub_db::models::user::User;
use bizhub_db::store::{SessionStore, UserDirectory};
use chrono::Utc;
use serde::Serialize;

use super::error::{storage_call, AuthError, AuthResult};
use super::jwt::{hash_token, TokenIssuer};
use super::password::CredentialVerifier;
use crate::config::AuthConfig;

/// Result of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub token: String,
    pub session_id: DbId,
    pub expires_at: Timestamp,
}

/// The `(user, session)` pair proven by a validated token.
///
/// Only [`SessionLifecycleManager::validate_token`] constructs it, so
/// operations that take one can trust both ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionIdentity {
    user_id: DbId,
    session_id: DbId,
}

impl SessionIdentity {
    pub fn user_id(&self) -> DbId {
        self.user_id
    }

    pub fn session_id(&self) -> DbId {
        self.session_id
    }
}

/// Everything known about the caller after token validation.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    pub identity: SessionIdentity,
    pub user: User,
    pub session: UserSession,
}

/// Orchestrates login, validation, logout and cleanup over the stores.
pub struct SessionLifecycleManager {
    users: Arc<dyn UserDirectory>,
    sessions: Arc<dyn SessionStore>,
    credentials: CredentialVerifier,
    tokens: TokenIssuer,
    provisional_ttl: chrono::Duration,
    storage_timeout: Duration,
}

impl SessionLifecycleManager {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        sessions: Arc<dyn SessionStore>,
        config: &AuthConfig,
    ) -> Self {
        let storage_timeout = config.storage_timeout();
        Self {
            credentials: CredentialVerifier::new(Arc::clone(&users), storage_timeout),
            tokens: TokenIssuer::new(config.signing_key.clone(), config.session_ttl()),
            users,
            sessions,
            provisional_ttl: config.provisional_ttl(),
            storage_timeout,
        }
    }

    /// The issuer used for this manager's tokens.
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Verify credentials and open a new session.
    ///
    /// Concurrent logins for one user yield independent sessions.
    pub async fn login(
        &self,
        identifier: &str,
        secret: &str,
        meta: ClientMeta,
    ) -> AuthResult<LoginOutcome> {
        let user = self.credentials.verify(identifier, secret).await?;

        let placeholder_expires_at = Utc::now()
            .checked_add_signed(self.provisional_ttl)
            .ok_or_else(|| {
                tracing::error!(user_id = user.id, "Provisional session expiry out of range");
                AuthError::TokenIssuanceFailure
            })?;
        let session_id = storage_call(
            "create_session",
            self.storage_timeout,
            self.sessions.create(user.id, &meta, placeholder_expires_at),
        )
        .await?;

        match self.bind_token(user.id, session_id).await {
            Ok(outcome) => {
                tracing::info!(user_id = user.id, session_id, "Session opened");
                Ok(outcome)
            }
            Err(err) => {
                self.discard_provisional(session_id).await;
                Err(err)
            }
        }
    }

    /// Mint the token for a provisional session and bind its hash.
    async fn bind_token(&self, user_id: DbId, session_id: DbId) -> AuthResult<LoginOutcome> {
        let issued = self.tokens.issue(user_id, session_id)?;

        let bound = storage_call(
            "finalize_session",
            self.storage_timeout,
            self.sessions
                .finalize(session_id, &issued.token_hash, issued.expires_at),
        )
        .await?;

        if !bound {
            tracing::warn!(
                user_id,
                session_id,
                "Provisional session disappeared before its token was bound"
            );
            return Err(AuthError::StorageFailure);
        }

        Ok(LoginOutcome {
            token: issued.token,
            session_id,
            expires_at: issued.expires_at,
        })
    }

    /// Compensating delete for a provisional row whose login failed.
    async fn discard_provisional(&self, session_id: DbId) {
        match storage_call(
            "discard_provisional_session",
            self.storage_timeout,
            self.sessions.delete(session_id),
        )
        .await
        {
            Ok(_) => tracing::debug!(session_id, "Discarded provisional session"),
            Err(_) => tracing::warn!(
                session_id,
                "Provisional session left for the cleanup sweep"
            ),
        }
    }

    /// Resolve a raw bearer token to its user and live session.
    pub async fn validate_token(&self, raw_token: &str) -> AuthResult<AuthenticatedSession> {
        let claims = self.tokens.verify(raw_token)?;

        let session = storage_call(
            "lookup_session",
            self.storage_timeout,
            self.sessions.lookup(claims.sid, claims.sub),
        )
        .await?
        .ok_or(AuthError::InvalidSession)?;

        if session.token_hash.as_deref() != Some(hash_token(raw_token).as_str()) {
            tracing::warn!(
                user_id = claims.sub,
                session_id = claims.sid,
                "Token does not match the hash bound to its session"
            );
            return Err(AuthError::InvalidSession);
        }

        let user = storage_call(
            "find_user_by_id",
            self.storage_timeout,
            self.users.find_by_id(claims.sub),
        )
        .await?
        .ok_or(AuthError::InvalidSession)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        Ok(AuthenticatedSession {
            identity: SessionIdentity {
                user_id: claims.sub,
                session_id: claims.sid,
            },
            user,
            session,
        })
    }

    /// Revoke the caller's own session.
    ///
    /// Returns `false` when there was nothing left to revoke; that is not an
    /// error.
    pub async fn logout(&self, identity: &SessionIdentity) -> AuthResult<bool> {
        let revoked = storage_call(
            "revoke_session",
            self.storage_timeout,
            self.sessions.revoke(identity.session_id, identity.user_id),
        )
        .await?;

        tracing::info!(
            user_id = identity.user_id,
            session_id = identity.session_id,
            revoked,
            "Session logout"
        );
        Ok(revoked)
    }

    /// Revoke every non-revoked session of `user_id` except `except`.
    pub async fn logout_all(&self, user_id: DbId, except: Option<DbId>) -> AuthResult<u64> {
        let revoked = storage_call(
            "revoke_all_sessions",
            self.storage_timeout,
            self.sessions.revoke_all(user_id, except),
        )
        .await?;

        tracing::info!(user_id, ?except, revoked, "Revoked user sessions");
        Ok(revoked)
    }

    /// The live sessions of `user_id`, most recent first.
    pub async fn list_sessions(&self, user_id: DbId) -> AuthResult<Vec<UserSession>> {
        storage_call(
            "list_sessions",
            self.storage_timeout,
            self.sessions.list_active(user_id),
        )
        .await
    }

    /// Physically delete expired and revoked sessions.
    ///
    /// Live and provisional rows are never matched by the purge predicate.
    pub async fn purge_expired_sessions(&self) -> AuthResult<u64> {
        storage_call(
            "purge_sessions",
            self.storage_timeout,
            self.sessions.purge_expired_or_revoked(),
        )
        .await
    }
}
