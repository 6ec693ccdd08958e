use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::errors::AppResult;
use crate::models::{DocumentStatus, SetPaidQuery, SetStatusQuery};
use crate::AppState;

pub async fn admin_list_users(State(state): State<AppState>) -> AppResult<Response> {
    let users = state.users.list_all().await?;
    let items: Vec<_> = users
        .iter()
        .map(|u| {
            json!({
                "user_id": u.id,
                "email": u.email,
                "is_paid": u.is_paid,
                "free_docs_used": u.free_docs_used,
            })
        })
        .collect();
    Ok(Json(json!(items)).into_response())
}

/// Grants or revokes unlimited uploads for an account. Revoking does not
/// touch `free_docs_used`, so a formerly-paid account at the cap is blocked
/// again immediately.
#[axum::debug_handler]
pub async fn admin_set_paid(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<SetPaidQuery>,
) -> AppResult<Response> {
    let user = state.users.set_paid_status(user_id, params.is_paid).await?;
    Ok(Json(json!({
        "user_id": user.id,
        "email": user.email,
        "is_paid": user.is_paid,
    }))
    .into_response())
}

/// Moves a document through the review pipeline on behalf of an external
/// reviewer.
#[axum::debug_handler]
pub async fn admin_set_document_status(
    State(state): State<AppState>,
    Path(document_id): Path<i64>,
    Query(params): Query<SetStatusQuery>,
) -> AppResult<Response> {
    let status: DocumentStatus = params.status.parse()?;
    let document = state
        .documents
        .set_status(document_id, status, params.review_notes.as_deref())
        .await?;

    Ok(Json(json!({
        "document_id": document.id,
        "status": document.status,
    }))
    .into_response())
}
