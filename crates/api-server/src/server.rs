//! API server — mounts the REST routes and the Prometheus metrics exporter.

use crate::rest::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use outreach_campaigns::CampaignService;
use outreach_core::config::AppConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

pub struct ApiServer {
    config: AppConfig,
    service: Arc<CampaignService>,
}

impl ApiServer {
    pub fn new(config: AppConfig, service: Arc<CampaignService>) -> Self {
        Self { config, service }
    }

    /// Start the HTTP server (blocks until shutdown).
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            service: self.service.clone(),
            start_time: Instant::now(),
        };

        let app = Router::new()
            .route("/healthz", get(rest::healthz))
            .route("/campaigns", post(rest::create_campaign).get(rest::list_campaigns))
            .route("/campaigns/:id", get(rest::get_campaign))
            .route("/campaigns/:id/launch", post(rest::launch_campaign))
            .route("/campaigns/:id/pause", post(rest::pause_campaign))
            .route("/campaigns/:id/resume", post(rest::resume_campaign))
            .route("/campaigns/:id/complete", post(rest::complete_campaign))
            .route("/campaigns/:id/execute", post(rest::execute_campaign))
            .route("/campaigns/:id/results", get(rest::campaign_results))
            .route("/campaigns/:id/metrics", get(rest::campaign_metrics))
            .route("/segment", post(rest::segment))
            .route("/generate", post(rest::generate))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
