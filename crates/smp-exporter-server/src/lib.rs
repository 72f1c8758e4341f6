//! HTTP exporter for Extron SMP/SMD appliances.
//!
//! Prometheus scrapes `/probe?target=<device>`; every scrape logs in to the
//! device, detects its model, fetches all telemetry in one batched request
//! and answers with a freshly built exposition. Exporter self-metrics are on
//! `/metrics`.

pub mod client;
pub mod error;
pub mod metrics;

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use smp_exporter_core::{ModelRegistry, ProbeExposition, ProbeReport, probe_descriptor};

pub use client::{ClientConfig, DeviceClient, DeviceError, DeviceSession};
pub use error::{ProbeFailure, ServerError};
pub use metrics::ExporterMetrics;

/// Prometheus text exposition content type.
pub const TEXT_FORMAT: &str = "text/plain; version=0.0.4; charset=utf-8";

const INDEX_HTML: &str = r#"<html>
<head><title>SMP Exporter</title></head>
<body>
<h1>SMP Exporter</h1>
<p><a href="/probe">Run a probe</a></p>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;

/// Listen address and device client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen_address: String,
    pub client: ClientConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0:9109".to_string(),
            client: ClientConfig::default(),
        }
    }
}

/// Shared server state.
pub struct AppState {
    registry: ModelRegistry,
    client: DeviceClient,
    metrics: ExporterMetrics,
}

impl AppState {
    pub fn new(config: &ClientConfig) -> Result<Self, ServerError> {
        Ok(Self {
            registry: ModelRegistry::builtin()?,
            client: DeviceClient::new(config)?,
            metrics: ExporterMetrics::new()?,
        })
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }
}

/// A successful probe: the report and its encoded exposition.
#[derive(Debug)]
pub struct ProbeOutput {
    pub report: ProbeReport,
    pub body: String,
}

/// Run one complete probe against `target`.
pub async fn probe_target(
    registry: &ModelRegistry,
    client: &DeviceClient,
    target: &str,
    authorization: Option<&str>,
) -> Result<ProbeOutput, ProbeFailure> {
    let start = Instant::now();
    let session = client.login(target, authorization).await?;
    let identity = session.detect_model().await;
    let descriptor = registry.resolve(&identity);
    let model = descriptor.key();
    info!("probing {} (model {identity:?}) as {model}", session.base());

    let report = probe_descriptor(descriptor, &session)
        .await
        .map_err(|source| ProbeFailure::Probe { model, source })?;
    let body = ProbeExposition::new(&report, start.elapsed())
        .and_then(|exposition| exposition.encode_text())
        .map_err(|source| ProbeFailure::Emit { model, source })?;
    Ok(ProbeOutput { report, body })
}

#[derive(Deserialize)]
struct ProbeParams {
    target: Option<String>,
}

async fn handle_probe(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProbeParams>,
    headers: HeaderMap,
) -> Response {
    let start = Instant::now();
    let result = match params.target.as_deref().map(str::trim) {
        None | Some("") => Err(ProbeFailure::MissingTarget),
        Some(target) => {
            let authorization = headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok());
            probe_target(&state.registry, &state.client, target, authorization).await
        }
    };

    let elapsed = start.elapsed();
    match result {
        Ok(output) => {
            info!(
                "probe of {} finished: {} readings in {:.3}s",
                output.report.unit.name,
                output.report.readings.len(),
                elapsed.as_secs_f64()
            );
            state
                .metrics
                .observe(output.report.model.as_str(), metrics::outcome::SUCCESS, elapsed);
            ([(header::CONTENT_TYPE, TEXT_FORMAT)], output.body).into_response()
        }
        Err(failure) => {
            warn!("probe failed ({}): {failure}", failure.status_code());
            let model = failure.model().map_or(metrics::UNKNOWN_MODEL, |m| m.as_str());
            state.metrics.observe(model, failure.outcome(), elapsed);
            failure.into_response()
        }
    }
}

async fn handle_metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode_text() {
        Ok(text) => ([(header::CONTENT_TYPE, TEXT_FORMAT)], text).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    models: Vec<&'static str>,
}

async fn handle_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: smp_exporter_core::VERSION,
        models: state
            .registry
            .descriptors()
            .iter()
            .map(|d| d.key().as_str())
            .collect(),
    })
}

/// Build the axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/probe", get(handle_probe))
        .route("/metrics", get(handle_metrics))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the exporter until the listener fails.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let state = Arc::new(AppState::new(&config.client)?);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .map_err(|source| ServerError::Bind {
            address: config.listen_address.clone(),
            source,
        })?;
    info!("listening on {}", config.listen_address);
    axum::serve(listener, app).await?;
    Ok(())
}
