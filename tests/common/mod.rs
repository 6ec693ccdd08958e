#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use docexplainer::config::{
    AdminConfig, AuthConfig, Config, DatabaseConfig, EmailConfig, ServerConfig, UploadConfig,
};
use docexplainer::{app, services, AppState};

pub const ADMIN_KEY: &str = "test-admin-key";

/// Fresh app state over a throwaway SQLite file and storage dir. The TempDir
/// must stay alive for as long as the state is used.
pub async fn test_state() -> (AppState, TempDir) {
    let dir = TempDir::new().unwrap();
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: format!("sqlite:{}", dir.path().join("test.db").display()),
            max_connections: 5,
        },
        auth: AuthConfig {
            jwt_secret: "integration-test-secret".to_string(),
            token_ttl_days: 7,
            // Lowest cost bcrypt accepts, to keep the suite fast.
            bcrypt_cost: 4,
        },
        admin: AdminConfig {
            api_key: ADMIN_KEY.to_string(),
        },
        upload: UploadConfig {
            max_file_size: 1024 * 1024,
            storage_dir: dir.path().join("storage").display().to_string(),
        },
        email: EmailConfig {
            smtp_host: None,
            smtp_username: None,
            smtp_password: None,
            from_address: "no-reply@test.local".to_string(),
            reset_base_url: "http://localhost:3000".to_string(),
        },
    };

    let pool = services::connect(&config.database).await.unwrap();
    let state = AppState::new(pool, config).unwrap();
    (state, dir)
}

pub async fn test_app() -> (Router, AppState, TempDir) {
    let (state, dir) = test_state().await;
    (app(state.clone()), state, dir)
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn plain_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub fn admin_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("x-admin-key", ADMIN_KEY)
        .body(Body::empty())
        .unwrap()
}

/// Multipart POST with a single `file` field, authenticated as `token`.
pub fn upload_request(token: &str, filename: &str, contents: &[u8]) -> Request<Body> {
    let boundary = "test-boundary-1d8f3a";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n\
             Content-Type: application/octet-stream\r\n\r\n",
            filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/documents/upload")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Registers an account and returns (user_id, bearer token).
pub async fn register_user(app: &Router, email: &str, password: &str) -> (i64, String) {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/auth/register",
            json!({ "email": email, "password": password }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    (
        body["user_id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}
