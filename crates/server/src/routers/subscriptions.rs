use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::app_state::AppState;

pub fn subscription_routers() -> Router<AppState> {
    Router::new()
        .route(
            "/newsfeed/{newsfeed_id}/subscriptions/",
            get(list_outgoing).post(create),
        )
        .route(
            "/newsfeed/{newsfeed_id}/subscriptions/{subscription_id}/",
            delete(delete_subscription),
        )
        .route(
            "/newsfeed/{newsfeed_id}/subscribers/subscriptions/",
            get(list_incoming),
        )
}

#[derive(Debug, Serialize)]
struct SubscriptionsPage {
    results: Vec<newsfeed_core::subscription::Subscription>,
}

/// `GET /newsfeed/{nf}/subscriptions/`: outgoing subscriptions.
async fn list_outgoing(
    State(state): State<AppState>,
    Path(newsfeed_id): Path<String>,
) -> Json<SubscriptionsPage> {
    let results = state
        .newsfeed
        .subscription_service
        .list_outgoing(&newsfeed_id)
        .await
        .iter()
        .map(|subscription| (**subscription).clone())
        .collect();
    Json(SubscriptionsPage { results })
}

/// `GET /newsfeed/{nf}/subscribers/subscriptions/`: incoming subscriptions.
async fn list_incoming(
    State(state): State<AppState>,
    Path(newsfeed_id): Path<String>,
) -> Json<SubscriptionsPage> {
    let results = state
        .newsfeed
        .subscription_service
        .list_incoming(&newsfeed_id)
        .await
        .iter()
        .map(|subscription| (**subscription).clone())
        .collect();
    Json(SubscriptionsPage { results })
}

#[derive(Debug, Deserialize)]
pub struct CreateSubscriptionRequest {
    pub to_newsfeed_id: String,
}

/// `POST /newsfeed/{nf}/subscriptions/`.
async fn create(
    State(state): State<AppState>,
    Path(newsfeed_id): Path<String>,
    Json(body): Json<CreateSubscriptionRequest>,
) -> Result<Json<newsfeed_core::subscription::Subscription>, ApiError> {
    let subscription = state
        .newsfeed
        .subscription_service
        .create(&newsfeed_id, &body.to_newsfeed_id)
        .await?;
    Ok(Json(subscription))
}

/// `DELETE /newsfeed/{nf}/subscriptions/{sid}/`.
async fn delete_subscription(
    State(state): State<AppState>,
    Path((newsfeed_id, subscription_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, ApiError> {
    state
        .newsfeed
        .subscription_service
        .delete(&newsfeed_id, subscription_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
