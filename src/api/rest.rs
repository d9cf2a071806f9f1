// =============================================================================
// REST API — Axum 0.7
// =============================================================================
//
// Three endpoints: `health` (public), `start_scan` and `scan_status`
// (Bearer-authenticated). Everything else the teacher's dashboard/control
// surface exposed (positions, regime snapshots, feature flags, kill switch,
// trade journal, websocket push) is out of scope here — this engine emits
// recommendations, it does not hold or manage positions.

use std::sync::Arc;

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::api::auth::AuthBearer;
use crate::app_state::AppState;
use crate::types::{FilterScope, Id, ScanSpec};

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/scans", post(start_scan))
        .route("/api/v1/scans/:id", get(scan_status))
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    server_time: i64,
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok", server_time: chrono::Utc::now().timestamp_millis() })
}

#[derive(Deserialize)]
struct StartScanRequest {
    scan_type: String,
    #[serde(default)]
    filter_scope: Option<FilterScope>,
    #[serde(default)]
    min_price: Option<f64>,
    #[serde(default)]
    max_price: Option<f64>,
    #[serde(default)]
    coin_limit: Option<u32>,
    #[serde(default)]
    confidence_threshold: Option<f64>,
}

#[derive(Serialize)]
struct StartScanResponse {
    run_id: Id,
}

async fn start_scan(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(req): Json<StartScanRequest>,
) -> impl IntoResponse {
    let profile = state.config.read().scan_profiles.get(&req.scan_type).cloned();
    let Some(profile) = profile else {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": format!("unknown scan_type: {}", req.scan_type)}))).into_response();
    };

    let spec = ScanSpec {
        scan_type: req.scan_type.clone(),
        filter_scope: req.filter_scope.unwrap_or(profile.filter_scope_default),
        min_price: req.min_price,
        max_price: req.max_price,
        coin_limit: req.coin_limit.unwrap_or(profile.coin_limit),
        confidence_threshold: req.confidence_threshold.unwrap_or(6.0),
        use_deep_ai: profile.use_llm,
    };

    let run_id = state.orchestrator.start_scan(spec).await;
    info!(run_id = %run_id, scan_type = %req.scan_type, "scan started via api");
    (StatusCode::ACCEPTED, Json(StartScanResponse { run_id })).into_response()
}

async fn scan_status(_auth: AuthBearer, State(state): State<Arc<AppState>>, Path(id): Path<Id>) -> impl IntoResponse {
    match state.orchestrator.scan_status(id).await {
        Ok(run) => Json(run).into_response(),
        Err(_) => (StatusCode::NOT_FOUND, Json(serde_json::json!({"error": "scan run not found"}))).into_response(),
    }
}
