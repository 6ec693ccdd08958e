use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::errors::{AppError, AppResult};
use crate::AppState;

/// Validates the bearer token, loads the account and stashes it in the
/// request extensions for handlers to pick up.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> AppResult<Response> {
    let token = bearer_token(&req)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;
    let user_id = state.tokens.validate(&token)?;

    // The token only proves who the caller was when it was issued; the
    // account itself is re-read on every request.
    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
}

/// Shared-secret gate for the admin surface. A missing key and a wrong key
/// are deliberately not distinguished.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> AppResult<Response> {
    let presented = req.headers().get("x-admin-key").and_then(|v| v.to_str().ok());
    match presented {
        Some(key) if keys_match(key, &state.config.admin.api_key) => Ok(next.run(req).await),
        _ => Err(AppError::Unauthorized("Invalid admin key".to_string())),
    }
}

/// Constant-time comparison of the presented key against the configured one.
/// Hashing both sides first gives fixed-length inputs, so neither the length
/// nor the position of a mismatch shows up in the timing.
fn keys_match(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    presented.ct_eq(&expected).into()
}
