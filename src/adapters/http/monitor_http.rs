//! Build monitor HTTP server.
//!
//! JSON endpoints for polling build status and logs, starting and stopping
//! builds, clearing a stale lock and downloading the database artifacts.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::io::ReaderStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::models::{ArtifactKind, LogReport, ServerConfig, StatusReport};
use crate::domain::MonitorError;
use crate::services::Coordinator;

/// Lines returned by `/api/logs` when the query does not say.
pub const DEFAULT_LOG_LINES: usize = 100;

/// Configuration for the monitor HTTP server.
#[derive(Debug, Clone)]
pub struct MonitorHttpConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS.
    pub enable_cors: bool,
}

impl Default for MonitorHttpConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for MonitorHttpConfig {
    fn from(server: &ServerConfig) -> Self {
        Self {
            host: server.host.clone(),
            port: server.port,
            enable_cors: server.enable_cors,
        }
    }
}

/// Query parameters for log retrieval.
///
/// `lines` is kept raw so that a missing, empty or non-numeric value falls
/// back to [`DEFAULT_LOG_LINES`] instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct LogQueryParams {
    #[serde(default)]
    pub lines: Option<String>,
}

impl LogQueryParams {
    pub fn lines(&self) -> usize {
        self.lines
            .as_deref()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_LOG_LINES)
    }
}

/// Body of every control endpoint response.
#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl ActionResponse {
    fn ok(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            pid: None,
        })
    }
}

/// A refused or failed request.
#[derive(Debug)]
pub struct ApiError(pub MonitorError);

impl From<MonitorError> for ApiError {
    fn from(err: MonitorError) -> Self {
        Self(err)
    }
}

/// HTTP status for each caller-facing failure.
pub const fn status_for(err: &MonitorError) -> StatusCode {
    match err {
        MonitorError::AlreadyRunning { .. }
        | MonitorError::StaleLock { .. }
        | MonitorError::MarkerUnreadable(_)
        | MonitorError::NoBuildRunning
        | MonitorError::BuildRunning { .. } => StatusCode::CONFLICT,
        MonitorError::ProcessNotFound { .. } | MonitorError::ArtifactNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        MonitorError::SignalFailed { .. }
        | MonitorError::MarkerRemoval(_)
        | MonitorError::SpawnFailure(_)
        | MonitorError::StreamFailure(_)
        | MonitorError::ArtifactUnreadable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }

        let body = ActionResponse {
            success: false,
            message: self.0.to_string(),
            pid: self.0.pid(),
        };
        (status, Json(body)).into_response()
    }
}

/// Build monitor HTTP server.
pub struct MonitorHttpServer {
    config: MonitorHttpConfig,
    coordinator: Arc<Coordinator>,
}

impl MonitorHttpServer {
    pub fn new(coordinator: Arc<Coordinator>, config: MonitorHttpConfig) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    /// Start the server.
    pub async fn serve(self) -> anyhow::Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = build_router(self.coordinator, self.config.enable_cors);

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Build monitor listening on {}", addr);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// Build the router.
pub fn build_router(coordinator: Arc<Coordinator>, enable_cors: bool) -> Router {
    let app = Router::new()
        .route("/api/status", get(get_status))
        .route("/api/logs", get(get_logs))
        .route("/api/build", post(start_build))
        .route("/api/build/stop", post(stop_build))
        .route("/api/clear-lock", post(clear_lock))
        .route("/api/download/db", get(download_db))
        .route("/api/download/metadata", get(download_metadata))
        .route("/health", get(health_check))
        .with_state(coordinator);

    if enable_cors {
        app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
            .layer(TraceLayer::new_for_http())
    } else {
        app.layer(TraceLayer::new_for_http())
    }
}

// Handler functions

async fn health_check() -> &'static str {
    "OK"
}

async fn get_status(State(coordinator): State<Arc<Coordinator>>) -> Json<StatusReport> {
    Json(coordinator.status().await)
}

async fn get_logs(
    State(coordinator): State<Arc<Coordinator>>,
    Query(params): Query<LogQueryParams>,
) -> Json<LogReport> {
    Json(coordinator.logs(params.lines()).await)
}

async fn start_build(
    State(coordinator): State<Arc<Coordinator>>,
) -> Result<Json<ActionResponse>, ApiError> {
    // Dropping the handle detaches the build from this request.
    let _build = coordinator.start_build().await?;
    Ok(ActionResponse::ok("Build started successfully"))
}

async fn stop_build(
    State(coordinator): State<Arc<Coordinator>>,
) -> Result<Json<ActionResponse>, ApiError> {
    let pid = coordinator.stop_build().await?;
    Ok(ActionResponse::ok(format!(
        "Stop signal sent to build process (PID: {pid})"
    )))
}

async fn clear_lock(
    State(coordinator): State<Arc<Coordinator>>,
) -> Result<Json<ActionResponse>, ApiError> {
    let outcome = coordinator.clear_lock().await?;
    Ok(ActionResponse::ok(outcome.message()))
}

async fn download_db(State(coordinator): State<Arc<Coordinator>>) -> Result<Response, ApiError> {
    download(&coordinator, ArtifactKind::DatabaseArchive).await
}

async fn download_metadata(
    State(coordinator): State<Arc<Coordinator>>,
) -> Result<Response, ApiError> {
    download(&coordinator, ArtifactKind::Metadata).await
}

async fn download(coordinator: &Coordinator, kind: ArtifactKind) -> Result<Response, ApiError> {
    let artifact = coordinator.artifact(kind).await?;
    let disposition = format!("attachment; filename=\"{}\"", artifact.download_name);

    Ok((
        [
            (header::CONTENT_TYPE, artifact.kind.content_type().to_string()),
            (header::CONTENT_LENGTH, artifact.size.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(ReaderStream::new(artifact.file)),
    )
        .into_response())
}
