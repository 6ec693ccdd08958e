use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::errors::AppError;

// The IntoResponse trait implementation converts AppError into a well-formed
// HTTP response with the {"detail": ...} body shape the clients expect.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match &self {
            AppError::DuplicateEmail => (StatusCode::BAD_REQUEST, self.to_string()),

            // Auth failures all map to 401; the messages stay deliberately
            // coarse so unknown-email and wrong-password are not separable.
            AppError::InvalidCredentials
            | AppError::InvalidOrExpiredToken
            | AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),

            // Quota denials get their own payment-required class
            AppError::QuotaExceeded => (StatusCode::PAYMENT_REQUIRED, self.to_string()),

            AppError::NotFound(_) => (StatusCode::NOT_FOUND, self.to_string()),

            AppError::InvalidStatus(_)
            | AppError::Validation(_)
            | AppError::Upload(_) => (StatusCode::BAD_REQUEST, self.to_string()),

            // Internal failures are logged in full but never echoed to callers
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::File(e) => {
                tracing::error!("File error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}
