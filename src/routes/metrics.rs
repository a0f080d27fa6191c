use crate::{server::SharedState, telemetry::TelemetryError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

pub async fn metrics_handler(State(state): State<SharedState>) -> Result<String, TelemetryError> {
    state.metrics.render()
}

impl IntoResponse for TelemetryError {
    fn into_response(self) -> Response {
        tracing::error!("Failed to render metrics: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
