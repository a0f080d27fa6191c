use crate::{
    config::{InputPrecision, ModelConfig},
    features::FeatureVector,
    model_service::{ModelService, ModelServiceError},
};
use async_trait::async_trait;
use ort::{
    session::{builder::GraphOptimizationLevel, Session},
    value::{DynValue, Tensor},
};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};

trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for i64 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

impl Truthy for i32 {
    fn is_truthy(&self) -> bool {
        *self != 0
    }
}

// NaN compares unequal to zero and counts as true.
impl Truthy for f32 {
    fn is_truthy(&self) -> bool {
        *self != 0.0
    }
}

impl Truthy for f64 {
    fn is_truthy(&self) -> bool {
        *self != 0.0
    }
}

fn first_truthy<T: Truthy>(labels: &[T]) -> Result<bool, ModelServiceError> {
    labels
        .first()
        .map(Truthy::is_truthy)
        .ok_or(ModelServiceError::EmptyPrediction)
}

fn coerce_label(value: &DynValue) -> Result<bool, ModelServiceError> {
    if let Ok((_, labels)) = value.try_extract_tensor::<i64>() {
        return first_truthy(labels);
    }
    if let Ok((_, labels)) = value.try_extract_tensor::<i32>() {
        return first_truthy(labels);
    }
    if let Ok((_, labels)) = value.try_extract_tensor::<bool>() {
        return first_truthy(labels);
    }
    if let Ok((_, labels)) = value.try_extract_tensor::<f32>() {
        return first_truthy(labels);
    }
    if let Ok((_, labels)) = value.try_extract_tensor::<f64>() {
        return first_truthy(labels);
    }
    Err(ModelServiceError::UnsupportedLabel)
}

fn resolve_tensor_name(
    available: &[String],
    configured: Option<&str>,
    kind: &'static str,
) -> Result<String, ModelServiceError> {
    match configured {
        Some(name) if available.iter().any(|n| n == name) => Ok(name.to_string()),
        Some(name) => Err(ModelServiceError::UnknownTensor(name.to_string())),
        None => available
            .first()
            .cloned()
            .ok_or(ModelServiceError::MissingTensor(kind)),
    }
}

#[derive(Clone)]
pub struct OrtModelService {
    sessions: Arc<Vec<Arc<Mutex<Session>>>>,
    counter: Arc<AtomicUsize>,
    input_name: String,
    label_output: String,
    input_precision: InputPrecision,
}

impl OrtModelService {
    pub fn new(model_config: &ModelConfig) -> Result<Self, ModelServiceError> {
        model_config
            .validate()
            .map_err(ModelServiceError::ArtifactUnavailable)?;

        let model_path = model_config.get_model_path();
        let num_instances = model_config.num_instances;
        let sessions = (0..num_instances)
            .map(|_| {
                let session = Session::builder()?
                    .with_optimization_level(GraphOptimizationLevel::Level3)?
                    .commit_from_file(&model_path)?;
                Ok(Arc::new(Mutex::new(session)))
            })
            .collect::<Result<Vec<_>, ort::Error>>()?;

        let (input_name, label_output) = {
            let session = sessions[0]
                .lock()
                .map_err(|e| ModelServiceError::SessionPoisoned(e.to_string()))?;
            let inputs: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();
            let outputs: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();
            (
                resolve_tensor_name(&inputs, model_config.input_name.as_deref(), "inputs")?,
                resolve_tensor_name(&outputs, model_config.label_output.as_deref(), "outputs")?,
            )
        };

        tracing::info!(
            "Created {} ONNX sessions from {:?} (input `{}`, label output `{}`)",
            num_instances,
            model_path,
            input_name,
            label_output
        );

        Ok(Self {
            sessions: Arc::new(sessions),
            counter: Arc::new(AtomicUsize::new(0)),
            input_name,
            label_output,
            input_precision: model_config.input_precision,
        })
    }

    pub fn run_inference(&self, features: &FeatureVector) -> Result<bool, ModelServiceError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst) % self.sessions.len();
        let mut session = self.sessions[index]
            .lock()
            .map_err(|e| ModelServiceError::SessionPoisoned(e.to_string()))?;

        tracing::debug!("Handling request with session {}", index);
        let outputs = match self.input_precision {
            InputPrecision::Float => {
                let tensor = Tensor::from_array(features.to_f32_matrix())?;
                session.run(ort::inputs![self.input_name.as_str() => tensor])?
            }
            InputPrecision::Double => {
                let tensor = Tensor::from_array(features.to_f64_matrix())?;
                session.run(ort::inputs![self.input_name.as_str() => tensor])?
            }
        };

        let hazardous = coerce_label(&outputs[self.label_output.as_str()])?;
        Ok(hazardous)
    }
}

#[async_trait]
impl ModelService for OrtModelService {
    async fn predict(&self, features: FeatureVector) -> Result<bool, ModelServiceError> {
        let service = self.clone();
        tokio::task::spawn_blocking(move || service.run_inference(&features)).await?
    }
}
