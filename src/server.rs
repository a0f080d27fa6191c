use crate::{
    config::{CorsConfig, ServerConfig},
    inference_service::InferenceService,
    model_service::ModelService,
    routes::api_routes,
    telemetry::Metrics,
};
use axum::Router;
use axum_otel_metrics::HttpMetricsLayerBuilder;
use std::{net::SocketAddr, sync::Arc};
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};
use tower_http::cors::CorsLayer;

/// Immutable per-process state handed to every handler.
#[derive(Clone)]
pub struct SharedState {
    pub inference_service: InferenceService,
    pub metrics: Arc<Metrics>,
}

impl SharedState {
    pub fn new(model_service: Arc<dyn ModelService>, metrics: Arc<Metrics>) -> Self {
        Self {
            inference_service: InferenceService::new(model_service),
            metrics,
        }
    }
}

impl CorsConfig {
    /// Any origin, method and header. With credentials the request origin is
    /// mirrored, since a wildcard cannot be combined with credentials.
    pub fn layer(&self) -> CorsLayer {
        if self.allow_credentials {
            CorsLayer::very_permissive()
        } else {
            CorsLayer::permissive()
        }
    }
}

pub fn build_router(state: SharedState, cors: &CorsConfig) -> Router {
    let metrics_layer = HttpMetricsLayerBuilder::new().build();

    let router = Router::new()
        .merge(api_routes())
        .with_state(state)
        .layer(metrics_layer);

    if cors.enabled {
        tracing::info!(
            "Cross-origin requests enabled (credentials: {})",
            cors.allow_credentials
        );
        router.layer(cors.layer())
    } else {
        router
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(
        state: SharedState,
        server_config: &ServerConfig,
        cors: &CorsConfig,
    ) -> anyhow::Result<Self> {
        let addr = server_config.get_address();
        let router = build_router(state, cors);
        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn run(
        self,
        mut shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", self.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await.ok();
                })
                .await?;
            tracing::info!("Server stopped");
            Ok::<_, anyhow::Error>(())
        });

        Ok(server_handle)
    }
}
