use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use crate::state::app_state::AppState;

/// Always returns `{"status": "OK"}`.
pub async fn status() -> impl IntoResponse {
    Json(json!({ "status": "OK" }))
}

pub fn health_routers() -> Router<AppState> {
    Router::new().route("/status/", get(status))
}
