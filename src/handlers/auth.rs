use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
    Extension,
};
use serde_json::json;

use crate::errors::AppResult;
use crate::models::{ForgotPasswordBody, LoginBody, RegisterBody, ResetPasswordBody, User};
use crate::services::users;
use crate::AppState;

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> AppResult<Response> {
    let user = state.users.register(&body.email, &body.password).await?;
    let token = state.tokens.issue(user.id)?;

    Ok(Json(json!({
        "user_id": user.id,
        "token": token,
    }))
    .into_response())
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> AppResult<Response> {
    tracing::debug!("Login attempt for {}", users::normalize_email(&body.email));
    let user = state.users.authenticate(&body.email, &body.password).await?;
    let token = state.tokens.issue(user.id)?;

    Ok(Json(json!({
        "user_id": user.id,
        "token": token,
        "free_docs_used": user.free_docs_used,
        "is_paid": user.is_paid,
    }))
    .into_response())
}

/// Profile of whoever the bearer token resolves to.
pub async fn me(Extension(user): Extension<User>) -> AppResult<Response> {
    Ok(Json(json!({
        "user_id": user.id,
        "email": user.email,
        "free_docs_used": user.free_docs_used,
        "is_paid": user.is_paid,
    }))
    .into_response())
}

/// Starts a password reset. The response is identical whether or not the
/// address has an account, so this endpoint cannot be used to enumerate
/// registered emails.
#[axum::debug_handler]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordBody>,
) -> AppResult<Response> {
    let email = users::normalize_email(&body.email);

    if let Some(user) = state.users.find_by_email(&email).await? {
        let secret = state.reset_tokens.issue(user.id).await?;
        let reset_link = format!(
            "{}/reset-password?token={}",
            state.config.email.reset_base_url, secret
        );
        // Fire and forget; delivery problems are logged, never reported here.
        let mailer = state.mailer.clone();
        tokio::spawn(async move {
            mailer.send_password_reset(&user.email, &reset_link).await;
        });
    } else {
        tracing::debug!("Password reset requested for unknown email");
    }

    Ok(Json(json!({
        "message": "If that email is registered, a password reset link has been sent.",
    }))
    .into_response())
}

#[axum::debug_handler]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordBody>,
) -> AppResult<Response> {
    state
        .reset_tokens
        .consume(&body.token, &body.new_password)
        .await?;

    Ok(Json(json!({
        "message": "Password has been reset.",
    }))
    .into_response())
}
