//! Bearer-token minting and verification.
//!
//! Tokens are HS256-signed JWTs containing a [`Claims`] payload that binds a
//! user id, a session id and an expiry. The signing key lives only in process
//! memory; only the SHA-256 hash of each issued token is persisted, so a
//! database leak does not expose usable credentials.

use bizhub_core::types::{DbId, Timestamp};
use chrono::{TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::error::{AuthError, AuthResult};

/// Claims embedded in every bearer token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Session the token is bound to.
    pub sid: DbId,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Unique token identifier (UUID v4).
    pub jti: String,
}

/// Process-wide HMAC key. Never persisted, never printed.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

/// Rejected signing key material.
#[derive(Debug, thiserror::Error)]
#[error("signing key must be at least {min} bytes, got {actual}")]
pub struct KeyTooShort {
    pub min: usize,
    pub actual: usize,
}

impl SigningKey {
    /// Minimum accepted key length in bytes.
    pub const MIN_LEN: usize = 32;

    /// Use caller-provided key material.
    pub fn from_bytes(secret: &[u8]) -> Result<Self, KeyTooShort> {
        if secret.len() < Self::MIN_LEN {
            return Err(KeyTooShort {
                min: Self::MIN_LEN,
                actual: secret.len(),
            });
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        })
    }

    /// Generate a fresh random key. Tokens signed with it die with the process.
    pub fn generate() -> Self {
        let mut secret = [0u8; Self::MIN_LEN];
        rand::rng().fill_bytes(&mut secret);
        Self {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
        }
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Why a token was rejected. Logged, never returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenRejection {
    Malformed,
    BadSignature,
    Expired,
}

impl TokenRejection {
    fn classify(kind: &ErrorKind) -> Self {
        match kind {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::BadSignature,
            _ => Self::Malformed,
        }
    }
}

/// A freshly minted token together with what the session row needs.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub token_hash: String,
    pub expires_at: Timestamp,
}

/// Mints and verifies bearer tokens with a single immutable key.
pub struct TokenIssuer {
    key: SigningKey,
    ttl: chrono::Duration,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(key: SigningKey, ttl: chrono::Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Token expiry must coincide with session expiry.
        validation.leeway = 0;
        Self {
            key,
            ttl,
            validation,
        }
    }

    /// Mint a token for `(user_id, session_id)` valid for the configured TTL.
    pub fn issue(&self, user_id: DbId, session_id: DbId) -> AuthResult<IssuedToken> {
        self.issue_at(user_id, session_id, Utc::now())
    }

    /// Mint a token as if issued at `issued_at`.
    pub fn issue_at(
        &self,
        user_id: DbId,
        session_id: DbId,
        issued_at: Timestamp,
    ) -> AuthResult<IssuedToken> {
        let iat = issued_at.timestamp();
        let exp = iat + self.ttl.num_seconds();
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or(AuthError::TokenIssuanceFailure)?;

        let claims = Claims {
            sub: user_id,
            sid: session_id,
            iat,
            exp,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key.encoding).map_err(|e| {
            tracing::error!(user_id, session_id, error = %e, "Token encoding failed");
            AuthError::TokenIssuanceFailure
        })?;

        Ok(IssuedToken {
            token_hash: hash_token(&token),
            token,
            expires_at,
        })
    }

    /// Validate signature and expiry, returning the embedded [`Claims`].
    ///
    /// Every failure is [`AuthError::InvalidToken`].
    pub fn verify(&self, token: &str) -> AuthResult<Claims> {
        self.inspect(token).map_err(|reason| {
            tracing::debug!(?reason, "Bearer token rejected");
            AuthError::InvalidToken
        })
    }

    /// Like [`verify`](Self::verify) but keeps the rejection reason.
    pub fn inspect(&self, token: &str) -> Result<Claims, TokenRejection> {
        decode::<Claims>(token, &self.key.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| TokenRejection::classify(e.kind()))
    }
}

/// Compute the SHA-256 hex digest of a bearer token.
///
/// This is the only form in which tokens are stored.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
