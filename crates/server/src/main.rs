use std::sync::Arc;

use dotenvy::dotenv;
use server::app::build_app;
use server::config::AppConfig;
use server::state::app_state::graceful_shutdown;
use tracing::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Arc::new(AppConfig::load()?);
    let (router, state) = build_app(config.clone());
    info!("newsfeed service initialized");

    let addr = config.bind_address()?;
    warn!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(graceful_shutdown(state))
        .await?;

    Ok(())
}
