use crate::server::SharedState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};
use tracing::instrument;

pub const SERVICE_MESSAGE: &str = "Asteroid Impact Prediction API";

#[derive(Serialize, Deserialize)]
pub struct Message {
    message: String,
}

#[instrument(skip(state))]
pub async fn root(State(state): State<SharedState>) -> Json<Message> {
    state.metrics.record_request("/");
    Json(Message {
        message: SERVICE_MESSAGE.into(),
    })
}
