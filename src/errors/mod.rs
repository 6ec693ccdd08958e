// Defines the application error type and a result type alias using the thiserror crate.
use thiserror::Error;

// Make the response module public
pub mod response;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("Free limit reached. Subscribe to upload unlimited documents.")]
    QuotaExceeded,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("status must be one of uploaded, in_review, completed (got '{0}')")]
    InvalidStatus(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Validation(String),

    #[error("Upload error: {0}")]
    Upload(String),

    // The #[from] attribute automatically converts a sqlx::Error into an AppError::Database using the From trait.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("File error: {0}")]
    File(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

// Custom result type
pub type AppResult<T> = Result<T, AppError>;
