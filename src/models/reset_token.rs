use chrono::{DateTime, Utc};
use sqlx::FromRow;

// A single-use password-reset grant. Only the SHA-256 hash of the secret is
// stored; the raw secret lives exactly as long as the email carrying it.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetToken {
    // Valid iff never consumed and not yet past its expiry. Callers must
    // still gate the actual consumption on a conditional UPDATE, this check
    // alone is not race free.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && now < self.expires_at
    }
}
