use crate::features::FeatureVector;
use async_trait::async_trait;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelServiceError {
    #[error("Model artifact unavailable: {0}")]
    ArtifactUnavailable(String),
    #[error("ONNX runtime error: {0}")]
    Runtime(#[from] ort::Error),
    #[error("Model has no tensor named `{0}`")]
    UnknownTensor(String),
    #[error("Model graph declares no {0}")]
    MissingTensor(&'static str),
    #[error("Session mutex poisoned: {0}")]
    SessionPoisoned(String),
    #[error("Model returned an empty prediction")]
    EmptyPrediction,
    #[error("Label tensor has an unsupported element type")]
    UnsupportedLabel,
    #[error("Inference task failed: {0}")]
    InferenceTask(#[from] tokio::task::JoinError),
}

impl IntoResponse for ModelServiceError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Something went wrong: {}", self),
        )
            .into_response()
    }
}

/// A loaded classifier: one feature vector in, one truth-coerced label out.
#[async_trait]
pub trait ModelService: Send + Sync + 'static {
    async fn predict(&self, features: FeatureVector) -> Result<bool, ModelServiceError>;
}
