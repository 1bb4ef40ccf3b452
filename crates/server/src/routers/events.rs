use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use newsfeed_core::event::EventData;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::app_state::AppState;

pub fn event_routers() -> Router<AppState> {
    Router::new()
        .route("/newsfeed/{newsfeed_id}/events/", get(list_events).post(post_event))
        .route("/newsfeed/{newsfeed_id}/events/{event_id}/", delete(delete_event))
}

#[derive(Debug, Serialize)]
struct EventsPage {
    results: Vec<newsfeed_core::event::Event>,
}

/// `GET /newsfeed/{nf}/events/`: most-recent first.
async fn list_events(
    State(state): State<AppState>,
    Path(newsfeed_id): Path<String>,
) -> Json<EventsPage> {
    let results = state.newsfeed.event_repository.get_by_newsfeed_id(&newsfeed_id).await;
    Json(EventsPage { results })
}

#[derive(Debug, Deserialize)]
pub struct PostEventRequest {
    pub data: EventData,
}

/// `POST /newsfeed/{nf}/events/`: validates and enqueues, returning the
/// originator's own record immediately — the fan-out to subscribers happens
/// on the processor pool's own time.
async fn post_event(
    State(state): State<AppState>,
    Path(newsfeed_id): Path<String>,
    Json(body): Json<PostEventRequest>,
) -> Result<(StatusCode, Json<newsfeed_core::event::Event>), ApiError> {
    let event = state
        .newsfeed
        .dispatcher
        .dispatch_new_event(&newsfeed_id, body.data)?;
    Ok((StatusCode::ACCEPTED, Json(event)))
}

/// `DELETE /newsfeed/{nf}/events/{eid}/`: enqueues cascading delete; no
/// synchronous existence check, the processor is authoritative.
async fn delete_event(
    State(state): State<AppState>,
    Path((newsfeed_id, event_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .newsfeed
        .dispatcher
        .dispatch_event_deletion(&newsfeed_id, event_id)?;
    Ok(StatusCode::NO_CONTENT)
}
