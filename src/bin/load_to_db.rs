//! Load the raw dataset into `heart_raw`. Safe to re-run.

use std::sync::Arc;

use anyhow::Context;
use heart_risk::{
    config::Config, dataset, db, logging, repository::PostgresHeartRepository,
    services::HeartEtlService,
};

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

    let repo = Arc::new(PostgresHeartRepository::new(pool.clone()));
    let before = repo.count().await?;

    let etl = HeartEtlService::new(dataset::loader_from_config(&config), repo.clone());
    let result = etl.run().await;

    let outcome = match result {
        Ok(submitted) => {
            let after = repo.count().await?;
            tracing::info!(submitted, before, after, "Dataset loaded into heart_raw");
            Ok(())
        }
        Err(e) => Err(anyhow::Error::new(e).context("ETL run failed")),
    };

    pool.close().await;
    outcome
}
