//! Fit the pipeline on the full dataset and write the model artifact.

use anyhow::Context;
use heart_risk::{config::Config, dataset, logging, services::TrainingService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("heart_risk=info");
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    let loader = dataset::loader_from_config(&config);
    let table = loader.load().await.context("loading training dataset")?;
    tracing::info!(rows = table.len(), "Dataset loaded");

    let destination = config.model_path.clone();
    let written = tokio::task::spawn_blocking(move || {
        TrainingService::new().fit_and_save(&table, &destination)
    })
    .await
    .context("training task panicked")??;

    tracing::info!("Model saved to {}", written.display());
    Ok(())
}
