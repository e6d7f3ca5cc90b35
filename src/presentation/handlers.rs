// HTTP request handlers
use crate::domain::chart::ReferenceMarker;
use crate::domain::derived::FieldValue;
use crate::domain::error::DashboardError;
use crate::infrastructure::frame_stream::stream_from_broadcast;
use crate::infrastructure::http_response::{SVG_CONTENT_TYPE, accepts_brotli, encoded_response};
use crate::presentation::app_state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct ChartQuery {
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub cycles: usize,
    pub snapshots: usize,
    pub waiting: bool,
    pub fetch_warning: Option<String>,
    /// Raw derived values of the latest record
    pub latest: BTreeMap<String, FieldValue>,
    pub charts: Vec<ChartStatus>,
}

#[derive(Serialize)]
pub struct ChartStatus {
    pub field: String,
    pub min: f64,
    pub max: f64,
    pub points: usize,
    pub markers: Vec<ReferenceMarker>,
    pub config_error: Option<String>,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Poll progress, the last fetch problem and the state of every chart
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let controller = state.controller.lock().await;

    let latest = controller
        .latest_record()
        .map(|record| {
            record
                .fields()
                .iter()
                .map(|f| (f.name.clone(), f.value.clone()))
                .collect()
        })
        .unwrap_or_default();

    let charts = controller
        .graphs()
        .map(|graph| {
            let (min, max) = graph.scale();
            ChartStatus {
                field: graph.target().field.clone(),
                min,
                max,
                points: graph.entries().len(),
                markers: graph.markers().to_vec(),
                config_error: graph.config_error().map(|e| e.to_string()),
            }
        })
        .collect();

    Json(StatusResponse {
        cycles: controller.history_len(),
        snapshots: controller.snapshot_count(),
        waiting: controller.is_waiting(),
        fetch_warning: controller.fetch_warning().map(str::to_string),
        latest,
        charts,
    })
}

/// Formatted value of every scalar output
pub async fn get_fields(State(state): State<Arc<AppState>>) -> Json<BTreeMap<String, String>> {
    let controller = state.controller.lock().await;
    Json(controller.display().clone())
}

/// Every recorded value of one field, oldest first
pub async fn get_history(
    Path(field): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FieldValue>>, (StatusCode, String)> {
    let controller = state.controller.lock().await;
    match controller.value_list(&field) {
        Ok(values) => Ok(Json(values)),
        Err(e @ (DashboardError::UnknownField(_) | DashboardError::FieldNotFound(_))) => {
            Err((StatusCode::NOT_FOUND, e.to_string()))
        }
        Err(e) => {
            tracing::error!("Error reading history of {}: {}", field, e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// SVG of one chart; passing dimensions resizes the chart target first
pub async fn get_chart(
    Path(field): Path<String>,
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let compress = accepts_brotli(&headers);

    let svg = {
        let mut controller = state.controller.lock().await;
        let result = match (query.width, query.height) {
            (None, None) => controller.chart_svg(&field),
            (width, height) => match controller.chart_dimensions(&field) {
                Ok((current_width, current_height)) => {
                    let width = width.unwrap_or(current_width);
                    let height = height.unwrap_or(current_height);
                    let valid = |v: f64| v.is_finite() && v > 0.0;
                    if !(valid(width) && valid(height)) {
                        return (StatusCode::BAD_REQUEST, "width and height must be positive and finite")
                            .into_response();
                    }
                    controller.resize_chart(&field, width, height)
                }
                Err(e) => Err(e),
            },
        };

        match result {
            Ok(Some(svg)) => svg,
            Ok(None) => {
                return (StatusCode::SERVICE_UNAVAILABLE, "chart has no data yet").into_response();
            }
            Err(e @ DashboardError::FieldNotFound(_)) => {
                return (StatusCode::NOT_FOUND, e.to_string()).into_response();
            }
            Err(e) => {
                tracing::error!("Error rendering chart {}: {}", field, e);
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    };

    match encoded_response(svg.into_bytes(), SVG_CONTENT_TYPE, compress).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream one frame per successful poll cycle
pub async fn stream_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let compress = accepts_brotli(&headers);
    stream_from_broadcast(state.frames.subscribe(), state.shutdown.clone(), compress).into_response()
}
