use std::sync::Arc;

use newsfeed_core::Newsfeed;
use tokio::signal::{self, unix::SignalKind};
use tracing::*;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub newsfeed: Arc<Newsfeed>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let newsfeed = Arc::new(Newsfeed::start(config.domain.clone()));
        AppState { newsfeed, config }
    }
}

/// Waits for a shutdown signal. Dropping the last `Arc<Newsfeed>` clone after
/// this resolves aborts the processor pool via `Newsfeed`'s `Drop` impl.
pub async fn graceful_shutdown(_state: AppState) {
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("received Ctrl+C, shutting down");
        }
        _ = async {
            let mut sigterm = signal::unix::signal(SignalKind::terminate())
                .expect("failed to listen for SIGTERM");
            sigterm.recv().await;
            info!("received SIGTERM, shutting down");
        } => {}
    }

    info!("bye");
}
