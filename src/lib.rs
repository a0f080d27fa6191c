mod app;
mod inference_service;
mod ort_service;
mod routes;

pub mod config;
pub mod features;
pub mod model_service;
pub mod schema;
pub mod server;
pub mod telemetry;

pub use app::start_app;
pub use inference_service::InferenceService;
pub use ort_service::OrtModelService;
