use std::sync::Arc;
use axum::{
    Router,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::config::Config;
use crate::error::EngineError;
use crate::metrics;
use crate::sourcing::engine::SourcingEngine;
use crate::sourcing::types::{BackupCriteria, SortKey, SupplierMetricBundle};

/// Web API server - the back-office calls this for supplier badges and
/// sourcing decisions
pub struct WebServer {
    engine: Arc<SourcingEngine>,
    config: Arc<Config>,
}

#[derive(Clone)]
struct AppState {
    engine: Arc<SourcingEngine>,
}

#[derive(Deserialize)]
struct CompareQuery {
    title: String,
    price: f64,
    sort: Option<SortKey>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScoreRequest {
    supplier_id: String,
    supplier_name: String,
    metrics: SupplierMetricBundle,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackupRequest {
    title: String,
    price: f64,
    current_supplier_id: Option<String>,
    #[serde(default)]
    criteria: BackupCriteria,
}

#[derive(Deserialize)]
struct JournalQuery {
    title: Option<String>,
    limit: Option<usize>,
}

/// JSON error body with a status code
struct ApiError(StatusCode, String);

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::InvalidInput(_) => ApiError(StatusCode::BAD_REQUEST, e.to_string()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(e: QueryRejection) -> Self {
        ApiError(StatusCode::BAD_REQUEST, e.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError(StatusCode::BAD_REQUEST, e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({ "error": self.1 }))).into_response()
    }
}

fn unknown_supplier(id: &str) -> ApiError {
    ApiError(StatusCode::NOT_FOUND, format!("Unknown supplier: {}", id))
}

impl WebServer {
    pub fn new(engine: Arc<SourcingEngine>, config: Arc<Config>) -> Self {
        Self { engine, config }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let app = router(self.engine.clone());

        let addr = format!("{}:{}", self.config.web.address, self.config.web.port);
        info!("🌐 Web API listening on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, app).await?;
        Ok(())
    }
}

fn router(engine: Arc<SourcingEngine>) -> Router {
    let state = AppState { engine };

    Router::new()
        .route("/api/health", get(api_health))
        .route("/api/stats", get(api_stats))
        .route("/api/suppliers", get(api_suppliers))
        .route("/api/suppliers/:id/reliability", get(api_reliability))
        .route(
            "/api/suppliers/:id/metrics",
            axum::routing::put(api_update_metrics).delete(api_delete_metrics),
        )
        .route("/api/score", post(api_score))
        .route("/api/compare", get(api_compare))
        .route("/api/compare/backup", post(api_backup))
        .route("/api/journal", get(api_journal))
        .route("/metrics", get(api_metrics))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

async fn api_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.engine.get_stats())
}

async fn api_suppliers(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(state.engine.list_suppliers())
}

async fn api_reliability(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let result = state
        .engine
        .score_supplier(&id)
        .await
        .ok_or_else(|| unknown_supplier(&id))?;
    Ok(Json(result).into_response())
}

/// Sync jobs push refreshed supplier stats here
async fn api_update_metrics(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<SupplierMetricBundle>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(bundle) = body?;
    let result = state
        .engine
        .update_metrics(&id, bundle)
        .await
        .ok_or_else(|| unknown_supplier(&id))?;
    Ok(Json(result).into_response())
}

async fn api_delete_metrics(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.engine.remove_metrics(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError(StatusCode::NOT_FOUND, format!("No metrics on record for {}", id)))
    }
}

async fn api_score(
    State(state): State<AppState>,
    body: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let result = state
        .engine
        .score_bundle(&req.supplier_id, &req.supplier_name, &req.metrics);
    Ok(Json(result).into_response())
}

async fn api_compare(
    State(state): State<AppState>,
    params: Result<Query<CompareQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = params?;
    let result = state
        .engine
        .compare(&params.title, params.price, params.sort)
        .await?;
    Ok(Json(result).into_response())
}

async fn api_backup(
    State(state): State<AppState>,
    body: Result<Json<BackupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let suggestion = state
        .engine
        .find_backup(
            &req.title,
            req.price,
            req.current_supplier_id.as_deref(),
            &req.criteria,
        )
        .await?;
    Ok(Json(suggestion).into_response())
}

async fn api_journal(
    State(state): State<AppState>,
    params: Result<Query<JournalQuery>, QueryRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let Query(params) = params?;
    let limit = params.limit.unwrap_or(100);
    let entries = state.engine.journal.search(params.title.as_deref(), limit);
    Ok(Json(serde_json::json!({
        "entries": entries,
        "stats": state.engine.journal.get_stats(),
    })))
}

async fn api_metrics(State(state): State<AppState>) -> Response {
    (
        [(axum::http::header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::render_prometheus(&state.engine),
    )
        .into_response()
}
