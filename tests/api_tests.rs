use asteroid_prediction::{
    config::{CorsConfig, ServerConfig},
    features::FeatureVector,
    model_service::{ModelService, ModelServiceError},
    server::{HttpServer, SharedState},
    telemetry::Metrics,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::broadcast;

struct ThresholdModelService;

#[async_trait]
impl ModelService for ThresholdModelService {
    async fn predict(&self, features: FeatureVector) -> Result<bool, ModelServiceError> {
        Ok(features.size > 100.0 && features.velocity > 10_000.0)
    }
}

struct BrokenModelService;

#[async_trait]
impl ModelService for BrokenModelService {
    async fn predict(&self, _features: FeatureVector) -> Result<bool, ModelServiceError> {
        Err(ModelServiceError::EmptyPrediction)
    }
}

struct TestApp {
    address: String,
    client: reqwest::Client,
    shutdown_tx: broadcast::Sender<()>,
}

impl TestApp {
    async fn spawn(model_service: Arc<dyn ModelService>, cors: CorsConfig) -> Self {
        let server_config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        };
        let metrics = Arc::new(Metrics::new().expect("failed to build metrics"));
        let state = SharedState::new(model_service, metrics);

        let server = HttpServer::new(state, &server_config, &cors)
            .await
            .expect("failed to bind server");
        let address = format!("http://{}", server.local_addr().unwrap());

        let (shutdown_tx, _) = broadcast::channel(1);
        server
            .run(shutdown_tx.subscribe())
            .await
            .expect("failed to start server");

        Self {
            address,
            client: reqwest::Client::new(),
            shutdown_tx,
        }
    }

    async fn post_predict(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/predict", self.address))
            .json(body)
            .send()
            .await
            .expect("failed to send request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
    }
}

async fn spawn_default() -> TestApp {
    TestApp::spawn(Arc::new(ThresholdModelService), CorsConfig::default()).await
}

#[tokio::test]
async fn root_returns_static_message() {
    let app = spawn_default().await;

    for _ in 0..2 {
        let response = app.client.get(&app.address).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"message": "Asteroid Impact Prediction API"}));
    }
}

#[tokio::test]
async fn predict_returns_single_boolean_field() {
    let app = spawn_default().await;

    let response = app
        .post_predict(&json!({"size": 120.5, "velocity": 18000, "distance": 75000}))
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 1);
    assert_eq!(object["hazardous"], json!(true));
}

#[tokio::test]
async fn predict_is_deterministic() {
    let app = spawn_default().await;
    let input = json!({"size": 12.0, "velocity": 18000, "distance": 75000});

    let mut answers = Vec::new();
    for _ in 0..3 {
        let body: Value = app.post_predict(&input).await.json().await.unwrap();
        answers.push(body["hazardous"].clone());
    }

    assert_eq!(answers, vec![json!(false); 3]);
}

#[tokio::test]
async fn predict_rejects_non_numeric_field() {
    let app = spawn_default().await;

    let response = app
        .post_predict(&json!({"size": "large", "velocity": 18000, "distance": 75000}))
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    let detail = body["detail"].as_array().unwrap();
    assert_eq!(detail.len(), 1);
    assert_eq!(detail[0]["type"], json!("float_parsing"));
    assert_eq!(detail[0]["loc"], json!(["body", "size"]));
    assert_eq!(detail[0]["input"], json!("large"));
}

#[tokio::test]
async fn predict_names_each_missing_field() {
    let app = spawn_default().await;

    for field in ["size", "velocity", "distance"] {
        let mut input = json!({"size": 1.0, "velocity": 2.0, "distance": 3.0});
        input.as_object_mut().unwrap().remove(field);

        let response = app.post_predict(&input).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["detail"][0]["type"], json!("missing"));
        assert_eq!(body["detail"][0]["loc"], json!(["body", field]));
    }
}

#[tokio::test]
async fn predict_rejects_malformed_json() {
    let app = spawn_default().await;

    let response = app
        .client
        .post(format!("{}/predict", app.address))
        .header("content-type", "application/json")
        .body("{\"size\": 1.0,")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"][0]["type"], json!("json_invalid"));
    assert_eq!(body["detail"][0]["loc"], json!(["body", 13]));
}

#[tokio::test]
async fn predict_does_not_decode_non_json_content() {
    let app = spawn_default().await;

    let response = app
        .client
        .post(format!("{}/predict", app.address))
        .header("content-type", "text/plain")
        .body(r#"{"size": 120.5, "velocity": 18000, "distance": 75000}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"][0]["type"], json!("model_attributes_type"));
    assert_eq!(body["detail"][0]["loc"], json!(["body"]));
}

#[tokio::test]
async fn model_failure_is_a_server_error() {
    let app = TestApp::spawn(Arc::new(BrokenModelService), CorsConfig::default()).await;

    let response = app
        .post_predict(&json!({"size": 1.0, "velocity": 2.0, "distance": 3.0}))
        .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn health_and_metrics_are_served() {
    let app = spawn_default().await;
    app.post_predict(&json!({"size": 1.0, "velocity": 2.0, "distance": 3.0}))
        .await;

    let health: Value = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health, json!({"status": "Available"}));

    let metrics = app
        .client
        .get(format!("{}/metrics", app.address))
        .send()
        .await
        .unwrap();
    assert_eq!(metrics.status(), StatusCode::OK);
}

#[tokio::test]
async fn cors_headers_absent_when_disabled() {
    let app = spawn_default().await;

    let response = app
        .client
        .get(&app.address)
        .header("origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();

    assert!(response
        .headers()
        .get("access-control-allow-origin")
        .is_none());
}

#[tokio::test]
async fn cors_mirrors_origin_with_credentials() {
    let cors = CorsConfig {
        enabled: true,
        allow_credentials: true,
    };
    let app = TestApp::spawn(Arc::new(ThresholdModelService), cors).await;

    let response = app
        .client
        .get(&app.address)
        .header("origin", "http://localhost:5173")
        .send()
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "http://localhost:5173"
    );
    assert_eq!(
        headers.get("access-control-allow-credentials").unwrap(),
        "true"
    );
}

#[tokio::test]
async fn cors_wildcard_without_credentials() {
    let cors = CorsConfig {
        enabled: true,
        allow_credentials: false,
    };
    let app = TestApp::spawn(Arc::new(ThresholdModelService), cors).await;

    let response = app
        .client
        .request(reqwest::Method::OPTIONS, format!("{}/predict", app.address))
        .header("origin", "http://localhost:5173")
        .header("access-control-request-method", "POST")
        .header("access-control-request-headers", "content-type")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
