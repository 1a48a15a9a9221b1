//! Heart-risk API server
//!
//! Loads the fitted model artifact, opens the database pool and serves
//! `POST /predict` until Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use heart_risk::{
    app::{create_router, AppState},
    config::Config,
    db, logging,
    repository::PostgresHeartRepository,
    services::PredictionService,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("heart_risk=debug,tower_http=debug");

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing::info!("Heart risk server starting...");
    tracing::info!("Database: {}", config.database_host());

    // The server refuses to start without a model
    let predictor = PredictionService::load(&config.model_path)
        .with_context(|| format!("loading model from {}", config.model_path.display()))?;
    tracing::info!(
        trees = predictor.tree_count(),
        trained_at = %predictor.metadata().trained_at,
        "Model loaded"
    );

    // Initialize database pool
    let pool = db::create_pool(&config)
        .await
        .context("Failed to create database pool")?;

    tracing::info!("Running database migrations...");
    db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let state = AppState {
        predictor: Arc::new(predictor),
        repo: Arc::new(PostgresHeartRepository::new(pool.clone())),
    };
    let app = create_router(state, &config.cors_origins);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    pool.close().await;
    tracing::info!("Database pool closed, bye");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
