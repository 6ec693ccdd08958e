use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;

use crate::errors::{AppError, AppResult};
use crate::models::User;
use crate::AppState;

/// Accepts a multipart upload from the `file` field. Unknown fields are
/// skipped with a warning rather than rejected.
#[axum::debug_handler]
pub async fn upload_document(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    mut multipart: Multipart,
) -> AppResult<Response> {
    let (original_filename, data) = read_upload(&mut multipart).await?;
    let (document, free_docs_used) = state.documents.store(&user, &original_filename, data).await?;

    Ok(Json(json!({
        "document_id": document.id,
        "original_filename": document.original_filename,
        "stored_filename": document.stored_filename,
        "free_docs_used": free_docs_used,
    }))
    .into_response())
}

// Helper function to walk the multipart form and pull out the file field
async fn read_upload(multipart: &mut Multipart) -> AppResult<(String, bytes::Bytes)> {
    let mut upload: Option<(String, bytes::Bytes)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to get next field from multipart form: {}", e);
        AppError::Upload(format!("Failed to process form field: {}", e))
    })? {
        match field.name().unwrap_or("") {
            "file" => {
                let original_filename = field.file_name().unwrap_or("unknown").to_string();
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read uploaded file: {}", e);
                    AppError::Upload(format!("Failed to read uploaded file: {}", e))
                })?;
                tracing::debug!("Received {} ({} bytes)", original_filename, data.len());
                upload = Some((original_filename, data));
            }
            field_name => {
                tracing::warn!("Unexpected form field: {}", field_name);
            }
        }
    }

    upload.ok_or_else(|| AppError::Upload("No file uploaded".to_string()))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Response> {
    let documents = state.documents.list_for_user(user.id).await?;
    let items: Vec<_> = documents
        .iter()
        .map(|d| {
            json!({
                "document_id": d.id,
                "original_filename": d.original_filename,
                "stored_filename": d.stored_filename,
                "created_at": d.created_at,
                "status": d.status,
            })
        })
        .collect();
    Ok(Json(json!(items)).into_response())
}

pub async fn get_document(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(document_id): Path<i64>,
) -> AppResult<Response> {
    let document = state.documents.get_for_user(user.id, document_id).await?;
    Ok(Json(json!({
        "document_id": document.id,
        "original_filename": document.original_filename,
        "stored_filename": document.stored_filename,
        "stored_path": document.stored_path,
        "created_at": document.created_at,
        "status": document.status,
        "review_notes": document.review_notes,
    }))
    .into_response())
}

/// Review slice of a document: just the status an external reviewer has set
/// and whatever notes came with it.
pub async fn get_document_review(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(document_id): Path<i64>,
) -> AppResult<Response> {
    let document = state.documents.get_for_user(user.id, document_id).await?;
    Ok(Json(json!({
        "document_id": document.id,
        "status": document.status,
        "review_notes": document.review_notes,
        "created_at": document.created_at,
    }))
    .into_response())
}
