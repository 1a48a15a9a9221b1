//! Prediction handler

use axum::{extract::State, Json};
use validator::Validate;

use crate::app::AppState;
use crate::models::{HeartRecord, PredictRequest, Prediction};
use crate::AppResult;

/// Score a record, then store it with the computed label.
pub async fn predict(
    State(state): State<AppState>,
    Json(req): Json<PredictRequest>,
) -> AppResult<Json<Prediction>> {
    req.validate()?;

    let mut record = HeartRecord::from(req);
    record.normalize_sentinels();

    let prediction = state.predictor.predict(&record);

    record.heart_disease = Some(prediction.label());
    state.repo.bulk_upsert(std::slice::from_ref(&record)).await?;

    tracing::debug!(
        probability = prediction.probability,
        has_disease = prediction.has_disease,
        "Prediction stored"
    );
    Ok(Json(prediction))
}
