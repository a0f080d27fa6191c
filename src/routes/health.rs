use crate::server::SharedState;
use axum::{extract::State, response::Json};
use serde::{Deserialize, Serialize};

const AVAILABLE: &str = "Available";

/// The model is loaded before the listener binds, so a response means ready.
#[derive(Serialize, Deserialize)]
pub struct Health {
    status: String,
}

pub async fn healthcheck(State(state): State<SharedState>) -> Json<Health> {
    state.metrics.record_request("/health");
    Json(Health {
        status: AVAILABLE.into(),
    })
}
