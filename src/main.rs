use anyhow::Context;

use docexplainer::{app, config::Config, services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration; a missing secret is fatal here, not per request
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize database pool and run migrations
    let pool = services::connect(&config.database)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(pool, config.clone()).context("Failed to build application state")?;

    // Mop up files left behind by a crash between write and record
    match state.documents.sweep_orphan_files().await {
        Ok(0) => {}
        Ok(removed) => tracing::info!("Removed {} orphaned upload(s)", removed),
        Err(e) => tracing::warn!("Orphan sweep failed: {}", e),
    }

    let app = app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server running on {}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;

    Ok(())
}
