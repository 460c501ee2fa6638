use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::{utils::time, AppState};

#[axum::debug_handler]
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let body = json!({
        "status": "healthy",
        "timestamp": time::to_iso8601_z(time::now()),
        "service": state.service_name,
    });
    (StatusCode::OK, Json(body))
}
