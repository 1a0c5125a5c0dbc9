use crate::commands::report_views;
use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use coaching_compliance::error::AppError;
use coaching_compliance::workflows::coaching::records::export_from_value;
use coaching_compliance::workflows::coaching::{ComplianceSnapshot, DirectorReportView};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

/// Record exports in the same shape the `preview` command reads from disk.
#[derive(Debug, Deserialize)]
pub(crate) struct CompliancePreviewRequest {
    pub(crate) workers: Value,
    pub(crate) coaching_sessions: Value,
    #[serde(default)]
    pub(crate) excluded_worker: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompliancePreviewResponse {
    pub(crate) director_count: usize,
    pub(crate) directors: Vec<DirectorReportView>,
}

pub(crate) fn router() -> axum::Router {
    axum::Router::new()
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/compliance/preview",
            axum::routing::post(compliance_preview_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn compliance_preview_endpoint(
    Json(payload): Json<CompliancePreviewRequest>,
) -> Result<Json<CompliancePreviewResponse>, AppError> {
    let CompliancePreviewRequest {
        workers,
        coaching_sessions,
        excluded_worker,
    } = payload;

    let workers = export_from_value(workers)?;
    let sessions = export_from_value(coaching_sessions)?;
    let snapshot = ComplianceSnapshot::from_records(&workers, &sessions, excluded_worker);
    let directors = report_views(&snapshot);

    info!(directors = directors.len(), "compliance preview served");

    Ok(Json(CompliancePreviewResponse {
        director_count: directors.len(),
        directors,
    }))
}
