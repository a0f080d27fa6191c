mod health;
mod metrics;
mod predict;
mod root;

use crate::server::SharedState;
use axum::{
    routing::{get, post},
    Router,
};

pub use health::healthcheck;
pub use metrics::metrics_handler;
pub use predict::predict;
pub use root::root;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/", get(root))
        .route("/predict", post(predict))
        .route("/health", get(healthcheck))
        .route("/metrics", get(metrics_handler))
}
