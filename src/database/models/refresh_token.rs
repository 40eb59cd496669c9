use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::mysql::MySqlPool;

use crate::database::named_params::execute;
use crate::database::DatabaseError;

/// Server-side store of issued refresh tokens. Only the SHA-256 of a token is kept,
/// in the `refresh_tokens` table of each university schema.
pub struct RefreshToken;

impl RefreshToken {
    pub async fn store(
        pool: &MySqlPool,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), DatabaseError> {
        execute(
            pool,
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at) \
             VALUES (:user_id, :token_hash, :expires_at)",
            &json!({
                "user_id": user_id,
                "token_hash": token_hash,
                "expires_at": expires_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            }),
        )
        .await?;
        Ok(())
    }

    /// Delete an unexpired token of `user_id` in one statement. Only the caller that
    /// removed the row may rotate it, so concurrent refreshes cannot both succeed.
    pub async fn consume(pool: &MySqlPool, user_id: i64, token_hash: &str) -> Result<bool, DatabaseError> {
        let result = execute(
            pool,
            "DELETE FROM refresh_tokens \
             WHERE token_hash = :token_hash AND user_id = :user_id AND expires_at > UTC_TIMESTAMP()",
            &json!({ "token_hash": token_hash, "user_id": user_id }),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke one token. Returns false when it was already gone.
    pub async fn revoke(pool: &MySqlPool, token_hash: &str) -> Result<bool, DatabaseError> {
        let result = execute(
            pool,
            "DELETE FROM refresh_tokens WHERE token_hash = :token_hash",
            &json!({ "token_hash": token_hash }),
        )
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every token of a user, e.g. after a password change
    pub async fn revoke_all_for_user(pool: &MySqlPool, user_id: i64) -> Result<u64, DatabaseError> {
        let result = execute(
            pool,
            "DELETE FROM refresh_tokens WHERE user_id = :user_id",
            &json!({ "user_id": user_id }),
        )
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn purge_expired(pool: &MySqlPool, user_id: i64) -> Result<u64, DatabaseError> {
        let result = execute(
            pool,
            "DELETE FROM refresh_tokens WHERE user_id = :user_id AND expires_at <= UTC_TIMESTAMP()",
            &json!({ "user_id": user_id }),
        )
        .await?;
        Ok(result.rows_affected())
    }
}
