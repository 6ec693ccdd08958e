use axum::response::{IntoResponse, Json};
use serde_json::json;

mod admin;
mod auth;
mod documents;

pub use admin::{admin_list_users, admin_set_document_status, admin_set_paid};
pub use auth::{forgot_password, login, me, register, reset_password};
pub use documents::{get_document, get_document_review, list_documents, upload_document};

pub async fn home() -> impl IntoResponse {
    Json(json!({ "message": "Document Explainer API is running" }))
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}
