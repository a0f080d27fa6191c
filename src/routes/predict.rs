use crate::{
    features::{PredictionRequest, PredictionResponse},
    model_service::ModelServiceError,
    schema::Validated,
    server::SharedState,
};
use axum::{extract::State, response::Json};
use std::time::Instant;
use tracing::instrument;

#[instrument(skip(state))]
pub async fn predict(
    State(state): State<SharedState>,
    Validated(request): Validated<PredictionRequest>,
) -> Result<Json<PredictionResponse>, ModelServiceError> {
    state.metrics.record_request("/predict");

    let started = Instant::now();
    let result = state.inference_service.predict(request).await;
    let duration_ms = started.elapsed().as_secs_f64() * 1000.0;

    match result {
        Ok(response) => {
            let outcome = if response.hazardous {
                "hazardous"
            } else {
                "safe"
            };
            state.metrics.record_prediction(duration_ms, outcome);
            Ok(Json(response))
        }
        Err(e) => {
            tracing::error!("Inference failed: {}", e);
            state.metrics.record_prediction(duration_ms, "error");
            Err(e)
        }
    }
}
