use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sm_core::{DiscoverOptions, YearRange};
use std::sync::Arc;
use tracing::{info, warn};
use crate::AppState;

pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn discover(
    State(state): State<Arc<AppState>>,
    Query(options): Query<DiscoverOptions>,
) -> Response {
    if let Err(e) = YearRange::parse_optional(options.year_range.as_deref()) {
        warn!("🚫 Rejected discover request: {}", e);
        return bad_request(e.to_string());
    }
    if let Err(e) = state.engine.config().check_count(options.count) {
        warn!("🚫 Rejected discover request: {}", e);
        return bad_request(e.to_string());
    }

    info!("🌐 GET /api/discover {:?}", options);
    let result = state.engine.discover(options).await;
    Json(result).into_response()
}

pub async fn get_story(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    info!("🌐 GET /api/stories/{}", id);
    let result = state.engine.explore(&id).await;
    let status = if result.success { StatusCode::OK } else { StatusCode::NOT_FOUND };
    (status, Json(result)).into_response()
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "success": false, "error": error }))).into_response()
}
