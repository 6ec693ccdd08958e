use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::config::DatabaseConfig;

pub mod documents;
pub mod mailer;
pub mod quota;
pub mod reset_tokens;
pub mod tokens;
pub mod users;

pub use documents::DocumentStore;
pub use mailer::Mailer;
pub use reset_tokens::ResetTokenLedger;
pub use tokens::TokenIssuer;
pub use users::UserStore;

// Opens the SQLite pool and applies migrations. WAL plus a busy timeout keeps
// the two transactional read-modify-write paths (quota reserve, token
// consume) waiting instead of failing when writers collide.
pub async fn connect(cfg: &DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&cfg.url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
