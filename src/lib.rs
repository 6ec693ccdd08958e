pub mod config;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::config::Config;
use crate::services::{DocumentStore, Mailer, ResetTokenLedger, TokenIssuer, UserStore};

/// Everything handlers need, cloned per request. The stores share one pool;
/// `pool` is also exposed directly for maintenance jobs and tests.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub users: UserStore,
    pub documents: DocumentStore,
    pub reset_tokens: ResetTokenLedger,
    pub tokens: TokenIssuer,
    pub mailer: Mailer,
    pub config: Config,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: Config) -> anyhow::Result<Self> {
        let mailer = Mailer::from_config(&config.email)?;
        Ok(Self {
            users: UserStore::new(pool.clone(), config.auth.bcrypt_cost),
            documents: DocumentStore::new(pool.clone(), config.upload.storage_dir.clone()),
            reset_tokens: ResetTokenLedger::new(pool.clone(), config.auth.bcrypt_cost),
            tokens: TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_days),
            mailer,
            pool,
            config,
        })
    }
}

/// Builds the application router around the shared state.
pub fn app(state: AppState) -> Router {
    // Open endpoints: liveness plus the credential lifecycle
    let public = Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
        .route("/auth/forgot-password", post(handlers::forgot_password))
        .route("/auth/reset-password", post(handlers::reset_password));

    // Everything here sees the resolved user in request extensions
    let authenticated = Router::new()
        .route("/me", get(handlers::me))
        .route("/documents/upload", post(handlers::upload_document))
        .route("/documents", get(handlers::list_documents))
        .route("/documents/:document_id", get(handlers::get_document))
        .route(
            "/documents/:document_id/review",
            get(handlers::get_document_review),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_auth));

    let admin = Router::new()
        .route("/admin/users", get(handlers::admin_list_users))
        .route("/admin/users/:user_id/set_paid", post(handlers::admin_set_paid))
        .route(
            "/admin/documents/:document_id/set_status",
            post(handlers::admin_set_document_status),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_admin));

    // Browser clients call this API from other origins during development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let max_file_size = state.config.upload.max_file_size;

    Router::new()
        .merge(public)
        .merge(authenticated)
        .merge(admin)
        .layer(cors)
        // File upload limits from config
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_file_size))
        .with_state(state)
}
