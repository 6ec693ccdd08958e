use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,              // stored normalized: trimmed + lowercased
    #[serde(skip_serializing)]
    pub password_hash: String,      // bcrypt hash, never sent to clients
    pub is_paid: bool,              // paid accounts bypass the free-tier cap
    pub free_docs_used: i64,        // lifetime counter, never decremented
    pub created_at: DateTime<Utc>,
}
