//! Create the `heart_raw` table and its identity index.

use anyhow::Context;
use heart_risk::{config::Config, db, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("heart_risk=info");
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    tracing::info!("Database: {}", config.database_host());
    let pool = db::create_pool(&config)
        .await
        .context("Failed to create database pool")?;
    db::run_migrations(&pool).await.context("Failed to run migrations")?;
    pool.close().await;
    Ok(())
}
