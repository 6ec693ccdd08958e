use chrono::Utc;
use sqlx::SqlitePool;

use crate::errors::{AppError, AppResult};
use crate::models::User;

/// Minimum password length, counted after trimming surrounding whitespace.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Account storage and credential checks on top of the shared pool.
#[derive(Clone)]
pub struct UserStore {
    pool: SqlitePool,
    bcrypt_cost: u32,
}

impl UserStore {
    pub fn new(pool: SqlitePool, bcrypt_cost: u32) -> Self {
        Self { pool, bcrypt_cost }
    }

    /// Creates an account with a hashed password. The UNIQUE constraint on
    /// email is the authoritative duplicate check, so a concurrent
    /// registration of the same address still comes back as `DuplicateEmail`.
    pub async fn register(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email);
        validate_email(&email)?;
        validate_password(password)?;
        let password_hash = hash_password(password, self.bcrypt_cost)?;

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, is_paid, free_docs_used, created_at) \
             VALUES (?1, ?2, 0, 0, ?3) RETURNING *",
        )
        .bind(&email)
        .bind(&password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::DuplicateEmail,
            other => AppError::Database(other),
        })?;

        tracing::info!("Registered user {} ({})", user.id, user.email);
        Ok(user)
    }

    /// Checks credentials for login. Unknown email and wrong password
    /// collapse into the same error so this path does not reveal which
    /// addresses have accounts.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email);
        let user = self
            .find_by_email(&email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;
        if !verify_password(password, &user.password_hash) {
            return Err(AppError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// All accounts, newest first. Admin-only caller.
    pub async fn list_all(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    /// Flips the paid flag and returns the updated row. Idempotent; setting
    /// an already-paid account to paid is not an error.
    pub async fn set_paid_status(&self, user_id: i64, is_paid: bool) -> AppResult<User> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_paid = ?1 WHERE id = ?2 RETURNING *",
        )
        .bind(is_paid)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(AppError::NotFound("User"))?;

        tracing::info!("Set is_paid={} for user {}", user.is_paid, user.id);
        Ok(user)
    }
}

/// Replaces a user's stored password hash. Generic over the executor so the
/// reset flow can run it inside its own transaction. Stateless bearer tokens
/// stay valid afterwards; nothing here can revoke them.
pub async fn set_password_hash<'e, E>(
    executor: E,
    user_id: i64,
    password_hash: &str,
) -> AppResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query("UPDATE users SET password_hash = ?1 WHERE id = ?2")
        .bind(password_hash)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Canonical form of an address as stored: trimmed, then lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Just enough shape checking to reject obviously malformed addresses;
// deliverability is the mailer's problem.
fn validate_email(email: &str) -> AppResult<()> {
    let ok = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if ok {
        Ok(())
    } else {
        Err(AppError::Validation("Invalid email address".to_string()))
    }
}

pub fn validate_password(password: &str) -> AppResult<()> {
    // Characters, not bytes, to match the rule the error message states.
    if password.trim().chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Hashes a password for storage. Surrounding whitespace is stripped before
/// hashing and again before verification, so both sides agree.
pub fn hash_password(password: &str, cost: u32) -> AppResult<String> {
    bcrypt::hash(password.trim(), cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// A malformed stored hash counts as a failed check rather than an error;
/// the caller only ever learns pass or fail.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    bcrypt::verify(password.trim(), password_hash).unwrap_or(false)
}
