use crate::{
    features::{PredictionRequest, PredictionResponse},
    model_service::{ModelService, ModelServiceError},
};
use std::sync::Arc;

#[derive(Clone)]
pub struct InferenceService {
    model_service: Arc<dyn ModelService>,
}

impl InferenceService {
    pub fn new(model_service: Arc<dyn ModelService>) -> Self {
        Self { model_service }
    }

    pub async fn predict(
        &self,
        request: PredictionRequest,
    ) -> Result<PredictionResponse, ModelServiceError> {
        let features = request.features();
        let hazardous = self.model_service.predict(features).await?;

        tracing::debug!(
            "Prediction for size={}, velocity={}, distance={}: hazardous={}",
            features.size,
            features.velocity,
            features.distance,
            hazardous
        );

        Ok(PredictionResponse { hazardous })
    }
}
