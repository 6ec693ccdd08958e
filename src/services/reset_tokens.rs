use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::SqlitePool;

use crate::errors::{AppError, AppResult};
use crate::models::PasswordResetToken;
use crate::services::users;

/// How long an issued reset token stays usable.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 30;

/// Bytes of entropy behind each raw secret (hex doubles this on the wire).
const SECRET_LEN: usize = 32;

/// Issues and consumes single-use password-reset tokens. Only the SHA-256 of
/// a secret is persisted; the raw value exists in the reset email and
/// nowhere else.
#[derive(Clone)]
pub struct ResetTokenLedger {
    pool: SqlitePool,
    bcrypt_cost: u32,
}

impl ResetTokenLedger {
    pub fn new(pool: SqlitePool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    /// Mints a fresh token for the user and returns the raw secret. Earlier
    /// tokens for the same user stay valid until they expire or get used.
    pub async fn issue(&self, user_id: i64) -> AppResult<String> {
        let secret = generate_secret();
        let token_hash = hash_secret(&secret);
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO password_reset_tokens (user_id, token_hash, expires_at, used_at, created_at) \
             VALUES (?1, ?2, ?3, NULL, ?4)",
        )
        .bind(user_id)
        .bind(&token_hash)
        .bind(now + Duration::minutes(RESET_TOKEN_TTL_MINUTES))
        .bind(now)
        .execute(&self.pool)
        .await?;

        tracing::debug!("Issued password reset token for user {}", user_id);
        Ok(secret)
    }

    /// Redeems a raw secret and swaps in the new password, both in one
    /// transaction. Unknown, expired and already-used secrets all come back
    /// as the same error. Returns the id of the user whose password changed.
    pub async fn consume(&self, secret: &str, new_password: &str) -> AppResult<i64> {
        let token_hash = hash_secret(secret);
        let now = Utc::now();

        let token = sqlx::query_as::<_, PasswordResetToken>(
            "SELECT * FROM password_reset_tokens WHERE token_hash = ?1",
        )
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::InvalidOrExpiredToken)?;

        if !token.is_valid(now) {
            return Err(AppError::InvalidOrExpiredToken);
        }

        // The token looks redeemable, so the new password is worth hashing.
        users::validate_password(new_password)?;
        let password_hash = users::hash_password(new_password, self.bcrypt_cost)?;

        // The guarded UPDATE re-checks validity inside the transaction, so
        // two racing redemptions of the same secret succeed exactly once.
        let mut tx = self.pool.begin().await?;
        let consumed = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = ?1 \
             WHERE id = ?2 AND used_at IS NULL AND expires_at > ?1",
        )
        .bind(now)
        .bind(token.id)
        .execute(&mut *tx)
        .await?;
        if consumed.rows_affected() == 0 {
            return Err(AppError::InvalidOrExpiredToken);
        }

        users::set_password_hash(&mut *tx, token.user_id, &password_hash).await?;
        tx.commit().await?;

        tracing::info!("Password reset completed for user {}", token.user_id);
        Ok(token.user_id)
    }
}

/// Fresh secret from the OS RNG, hex encoded. The hex form is what travels
/// in the email link.
pub fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_LEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// One-way fingerprint of a secret as stored in the ledger.
pub fn hash_secret(secret: &str) -> String {
    hex::encode(Sha256::digest(secret.as_bytes()))
}
