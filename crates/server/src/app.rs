use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::middlewares::log;
use crate::routers::{events, health, subscriptions};
use crate::state::app_state::AppState;

pub fn build_app(config: Arc<AppConfig>) -> (Router, AppState) {
    let state = AppState::new(config.clone());

    let base_path = config.server.base_path.trim_end_matches('/');
    let inner = Router::new()
        .merge(health::health_routers())
        .merge(events::event_routers())
        .merge(subscriptions::subscription_routers());
    let router = if base_path.is_empty() {
        inner
    } else {
        Router::new().nest(base_path, inner)
    }
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(log::log_request))
        .with_state(state.clone());

    (router, state)
}
