//! Axum HTTP server: router, handlers, graceful shutdown.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entry::{Activity, LogEntry};
use crate::error::ApiError;
use crate::identity::{now_rfc3339, PodIdentity};
use crate::report;
use crate::sink::{self, LogSink};
use crate::store::LogStore;

const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub identity: PodIdentity,
    pub store: LogStore,
    pub sink: Arc<dyn LogSink>,
}

impl AppState {
    /// Fresh identity, empty store, and the configured sink.
    pub fn new(config: AppConfig) -> Self {
        let store = LogStore::new(config.logs.capacity);
        let sink = sink::from_kind(config.sink.kind);
        Self {
            config,
            identity: PodIdentity::generate(),
            store,
            sink,
        }
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/api/log", post(handle_log))
        .route("/api/logs/guid", get(handle_guid_logs))
        .route("/api/logs/data", get(handle_data_logs))
        .route("/api/pod-guid", get(handle_pod_guid))
        .route("/api/pod-status", get(handle_pod_status))
        .route("/api/health", get(handle_health))
        .fallback(handle_fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Build and run the HTTP server.
pub async fn run(state: AppState) -> anyhow::Result<()> {
    let listen_addr = state.config.server.listen_address.clone();
    let pod_guid = state.identity.id();

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    tracing::info!(address = %listen_addr, pod_guid = %pod_guid, "podtrack listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("podtrack shut down gracefully");
    Ok(())
}

/// POST /api/log — validate, count, store, and forward one activity event.
async fn handle_log(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let activity = parse_activity(&body).inspect_err(|e| {
        tracing::warn!(error = %e, "Rejected log payload");
    })?;

    let span = podtrack_tracing::ingest_span!(state.identity.id(), &activity.guid);
    let log_id = span.in_scope(|| ingest(&state, activity))?;

    Ok(Json(json!({
        "success": true,
        "message": "Log entry recorded",
        "logId": log_id.to_string(),
    }))
    .into_response())
}

fn ingest(state: &AppState, activity: Activity) -> Result<Uuid, ApiError> {
    let Activity {
        action,
        guid,
        details,
        timestamp,
        pod_name,
    } = activity;

    let pod_name = pod_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| state.config.pod.name.clone());
    let pod_guid = state.identity.id();

    let entry = state.store.record(|request_number| LogEntry {
        server_timestamp: Utc::now(),
        pod_name,
        pod_guid,
        action,
        details,
        request_number,
        client_guid: guid,
        client_timestamp: timestamp,
    })?;

    let log_id = Uuid::new_v4();
    let span = tracing::Span::current();
    span.record("request_number", entry.request_number);
    span.record("log_id", tracing::field::display(log_id));

    tracing::info!(
        action = %entry.action,
        request_number = entry.request_number,
        "Activity logged"
    );

    sink::publish_best_effort(state.sink.as_ref(), &entry);
    Ok(log_id)
}

/// Validate the ingestion payload shape.
///
/// `action`, `guid`, `details` and `timestamp` must be present strings;
/// `podName` may be absent or null, otherwise it must be a string too.
fn parse_activity(body: &[u8]) -> Result<Activity, ApiError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| ApiError::Validation(format!("invalid JSON body: {e}")))?;
    let obj = value
        .as_object()
        .ok_or_else(|| ApiError::Validation("request body must be a JSON object".to_string()))?;

    let required = |field: &str| match obj.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ApiError::Validation(format!("field '{field}' must be a string"))),
        None => Err(ApiError::Validation(format!("missing field '{field}'"))),
    };

    let pod_name = match obj.get("podName") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            return Err(ApiError::Validation(
                "field 'podName' must be a string".to_string(),
            ))
        }
    };

    Ok(Activity {
        action: required("action")?,
        guid: required("guid")?,
        details: required("details")?,
        timestamp: required("timestamp")?,
        pod_name,
    })
}

/// GET /api/logs/guid — identity header plus every buffered entry.
async fn handle_guid_logs(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    let _span = podtrack_tracing::api_request_span!("/api/logs/guid", state.identity.id()).entered();
    let snapshot = state.store.snapshot()?;
    Ok(report::guid_report(
        &state.identity,
        &state.config.pod.name,
        &snapshot,
    ))
}

/// GET /api/logs/data — entries with `|` replaced by `-`.
async fn handle_data_logs(State(state): State<Arc<AppState>>) -> Result<String, ApiError> {
    let _span = podtrack_tracing::api_request_span!("/api/logs/data", state.identity.id()).entered();
    let snapshot = state.store.snapshot()?;
    Ok(report::data_report(
        &state.identity,
        &state.config.pod.name,
        &snapshot,
    ))
}

/// GET /api/pod-guid
async fn handle_pod_guid(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let counts = state.store.counts()?;
    Ok(Json(json!({
        "podGuid": state.identity.id().to_string(),
        "podName": state.config.pod.name,
        "startTime": state.identity.started_at_rfc3339(),
        "requestsHandled": counts.requests,
        "timestamp": now_rfc3339(),
        "uptime": state.identity.uptime_secs(Utc::now()),
    }))
    .into_response())
}

/// GET /api/pod-status — identity, counters, and deployment metadata.
async fn handle_pod_status(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let counts = state.store.counts()?;
    let pod = &state.config.pod;
    Ok(Json(json!({
        "deployment": pod.deployment,
        "podName": pod.name,
        "podGuid": state.identity.id().to_string(),
        "namespace": pod.namespace,
        "podIP": pod.ip,
        "startTime": state.identity.started_at_rfc3339(),
        "uptime": state.identity.uptime_secs(Utc::now()),
        "requestsProcessed": counts.requests,
        "logEntries": counts.entries,
        "timestamp": now_rfc3339(),
    }))
    .into_response())
}

/// GET /api/health
async fn handle_health(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let counts = state.store.counts()?;
    Ok(Json(json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "timestamp": now_rfc3339(),
        "podGuid": state.identity.id().to_string(),
        "uptime": state.identity.uptime_secs(Utc::now()),
        "requestsProcessed": counts.requests,
        "deploymentReady": true,
    }))
    .into_response())
}

/// (method, path, description) for every route, listed by `GET /`.
const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("POST", "/api/log", "Record a tile activity event"),
    ("GET", "/api/logs/guid", "Recent activity with pod identity header"),
    ("GET", "/api/logs/data", "Recent activity, dash-separated"),
    ("GET", "/api/pod-guid", "Identity of the pod serving this request"),
    ("GET", "/api/pod-status", "Pod identity, counters and deployment metadata"),
    ("GET", "/api/health", "Liveness and readiness"),
];

/// GET / — service descriptor.
async fn handle_root(State(state): State<Arc<AppState>>) -> Response {
    let endpoints: Vec<Value> = ENDPOINTS
        .iter()
        .map(|(method, path, description)| {
            json!({ "method": method, "path": path, "description": description })
        })
        .collect();

    Json(json!({
        "service": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "podGuid": state.identity.id().to_string(),
        "podName": state.config.pod.name,
        "endpoints": endpoints,
    }))
    .into_response()
}

async fn handle_fallback(request: Request) -> Response {
    tracing::debug!(
        method = %request.method(),
        path = %request.uri().path(),
        "No route matched"
    );
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "not found" })),
    )
        .into_response()
}

/// Wait for SIGINT or SIGTERM (sent by Kubernetes on pod termination).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
