use super::{AppState, lock};
use crate::histogram::{
    HistogramData, MultiHistogramLayout, compute_threshold_line, validate_histogram,
};
use crate::output::{HistogramReport, Resolution};
use crate::sankey::{SankeyData, SankeyLayout, SortConfig};
use crate::threshold::{GroupOutcome, HierarchicalThresholds, Metric};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request problems, answered with a JSON `{"errors": [...]}` body.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The payload parsed but failed validation (422).
    InvalidPayload(Vec<String>),
    /// The request itself is inconsistent (400).
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, errors) = match self {
            ApiError::InvalidPayload(errors) => (StatusCode::UNPROCESSABLE_ENTITY, errors),
            ApiError::BadRequest(error) => (StatusCode::BAD_REQUEST, vec![error]),
        };
        (status, Json(serde_json::json!({ "errors": errors }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct SankeyRequest {
    pub data: SankeyData,
    pub width: Option<f64>,
    pub height: Option<f64>,
    #[serde(default)]
    pub sort: SortConfig,
}

#[derive(Debug, Deserialize)]
pub struct HistogramRequest {
    pub data: HistogramData,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub threshold: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct HistogramsRequest {
    pub data: Vec<HistogramData>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub node_id: String,
    /// Defaults to every metric.
    pub metrics: Option<Vec<Metric>>,
    /// Defaults to the node ids of the last Sankey request.
    pub known_node_ids: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct GlobalRequest {
    pub metric: Metric,
    pub value: f64,
}

/// With a `value`, set (needs `metric`). Without, clear one metric or all.
#[derive(Debug, Deserialize)]
pub struct NodeRequest {
    pub node_id: String,
    pub metric: Option<Metric>,
    pub value: Option<f64>,
}

/// With a `value`, set (needs `metric`). Without, clear one metric or all.
#[derive(Debug, Deserialize)]
pub struct GroupRequest {
    pub group_id: String,
    pub metric: Option<Metric>,
    pub value: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct GroupResponse {
    pub outcome: GroupOutcome,
    pub thresholds: HierarchicalThresholds,
}

fn size(state: &AppState, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
    (
        width.unwrap_or(state.config.layout.width),
        height.unwrap_or(state.config.layout.height),
    )
}

pub async fn index_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "saeflow",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": [
            "POST /api/layout/sankey",
            "POST /api/layout/histogram",
            "POST /api/layout/histograms",
            "GET /api/thresholds",
            "POST /api/thresholds/resolve",
            "POST /api/thresholds/global",
            "POST /api/thresholds/node",
            "POST /api/thresholds/group",
            "POST /api/thresholds/reset",
        ],
    }))
}

pub async fn sankey_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SankeyRequest>,
) -> Json<Arc<SankeyLayout>> {
    let (width, height) = size(&state, req.width, req.height);
    *lock(&state.known_node_ids) = req.data.nodes.iter().map(|n| n.id.clone()).collect();
    let layout = lock(&state.engine).sankey(&req.data, width, height, req.sort);
    Json(layout)
}

pub async fn histogram_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HistogramRequest>,
) -> Result<Json<HistogramReport>, ApiError> {
    let problems = validate_histogram(&req.data);
    if !problems.is_empty() {
        return Err(ApiError::InvalidPayload(problems));
    }
    let (width, height) = size(&state, req.width, req.height);
    let layout = lock(&state.engine).histogram(&req.data, width, height);
    let threshold_line = req
        .threshold
        .map(|value| compute_threshold_line(value, &layout));
    Ok(Json(HistogramReport {
        layout,
        threshold_line,
    }))
}

pub async fn histograms_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<HistogramsRequest>,
) -> Result<Json<MultiHistogramLayout>, ApiError> {
    let problems: Vec<String> = req
        .data
        .iter()
        .flat_map(|data| {
            validate_histogram(data)
                .into_iter()
                .map(move |p| format!("{}: {}", data.metric, p))
        })
        .collect();
    if !problems.is_empty() {
        return Err(ApiError::InvalidPayload(problems));
    }
    let (width, height) = size(&state, req.width, req.height);
    Ok(Json(lock(&state.engine).histograms(&req.data, width, height)))
}

pub async fn thresholds_handler(State(state): State<Arc<AppState>>) -> Json<HierarchicalThresholds> {
    Json(lock(&state.thresholds).to_document())
}

pub async fn resolve_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> Json<Resolution> {
    let metrics = req.metrics.unwrap_or_else(|| Metric::ALL.to_vec());
    let known = match req.known_node_ids {
        Some(ids) => ids,
        None => lock(&state.known_node_ids).clone(),
    };
    let store = lock(&state.thresholds);
    Json(Resolution::compute(&store, &req.node_id, &metrics, &known))
}

pub async fn global_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GlobalRequest>,
) -> Json<HierarchicalThresholds> {
    let mut store = lock(&state.thresholds);
    store.set_global_threshold(req.metric, req.value);
    Json(store.to_document())
}

pub async fn node_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NodeRequest>,
) -> Result<Json<HierarchicalThresholds>, ApiError> {
    let mut store = lock(&state.thresholds);
    match (req.metric, req.value) {
        (Some(metric), Some(value)) => store.set_node_threshold(&req.node_id, metric, value),
        (None, Some(_)) => {
            return Err(ApiError::BadRequest(
                "metric is required when setting a value".to_string(),
            ));
        }
        (metric, None) => store.clear_node_threshold(&req.node_id, metric),
    }
    Ok(Json(store.to_document()))
}

pub async fn group_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GroupRequest>,
) -> Result<Json<GroupResponse>, ApiError> {
    let mut store = lock(&state.thresholds);
    let outcome = match (req.metric, req.value) {
        (Some(metric), Some(value)) => store.set_threshold_group(&req.group_id, metric, value),
        (None, Some(_)) => {
            return Err(ApiError::BadRequest(
                "metric is required when setting a value".to_string(),
            ));
        }
        (metric, None) => store.clear_threshold_group(&req.group_id, metric),
    };
    Ok(Json(GroupResponse {
        outcome,
        thresholds: store.to_document(),
    }))
}

pub async fn reset_handler(State(state): State<Arc<AppState>>) -> Json<HierarchicalThresholds> {
    let mut store = lock(&state.thresholds);
    store.reset_thresholds();
    Json(store.to_document())
}
