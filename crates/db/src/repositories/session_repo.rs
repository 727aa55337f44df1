//! Repository for the `user_sessions` table.

use bizhub_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::session::{ClientMeta, UserSession};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, token_hash, issued_at, expires_at, revoked_at, \
                        ip_address, user_agent, created_at, updated_at";

/// Provides the session lifecycle queries.
///
/// Every "live session" predicate requires a bound token hash, no revocation
/// timestamp, and an expiry in the future.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a provisional session (no token hash) and return its id.
    pub async fn create_provisional(
        pool: &PgPool,
        user_id: DbId,
        meta: &ClientMeta,
        placeholder_expires_at: Timestamp,
    ) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar::<_, DbId>(
            "INSERT INTO user_sessions (user_id, expires_at, ip_address, user_agent)
             VALUES ($1, $2, $3, $4)
             RETURNING id",
        )
        .bind(user_id)
        .bind(placeholder_expires_at)
        .bind(&meta.ip_address)
        .bind(&meta.user_agent)
        .fetch_one(pool)
        .await
    }

    /// Bind the issued token hash and real expiry to a provisional session.
    ///
    /// Returns `false` if the row is gone, already bound, revoked, or its
    /// placeholder expiry has passed.
    pub async fn finalize(
        pool: &PgPool,
        id: DbId,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions
             SET token_hash = $2, expires_at = $3, issued_at = NOW(), updated_at = NOW()
             WHERE id = $1
               AND token_hash IS NULL
               AND revoked_at IS NULL
               AND expires_at > NOW()",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Find a live session by id, scoped to its owning user.
    pub async fn find_active(
        pool: &PgPool,
        id: DbId,
        user_id: DbId,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE id = $1
               AND user_id = $2
               AND token_hash IS NOT NULL
               AND revoked_at IS NULL
               AND expires_at > NOW()"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// List a user's live sessions, most recently issued first.
    pub async fn list_active_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Vec<UserSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM user_sessions
             WHERE user_id = $1
               AND token_hash IS NOT NULL
               AND revoked_at IS NULL
               AND expires_at > NOW()
             ORDER BY issued_at DESC, id DESC"
        );
        sqlx::query_as::<_, UserSession>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Revoke a single session. Returns `true` if the row was updated.
    pub async fn revoke(pool: &PgPool, id: DbId, user_id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW(), updated_at = NOW()
             WHERE id = $1 AND user_id = $2 AND revoked_at IS NULL",
        )
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke all non-revoked sessions for a user, optionally sparing one.
    /// Returns the count of revoked sessions.
    pub async fn revoke_all_for_user(
        pool: &PgPool,
        user_id: DbId,
        except_id: Option<DbId>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked_at = NOW(), updated_at = NOW()
             WHERE user_id = $1
               AND revoked_at IS NULL
               AND ($2::BIGINT IS NULL OR id <> $2)",
        )
        .bind(user_id)
        .bind(except_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Hard-delete one session. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete expired or revoked sessions. Returns the count of deleted rows.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM user_sessions WHERE expires_at <= NOW() OR revoked_at IS NOT NULL",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
