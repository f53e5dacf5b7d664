use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use emotion_reply_backend::{
    config::Config, routes, services::generator::GeminiClient, state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    info!(?config, "configuration loaded");
    if config.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; /get-reply will answer with AuthError");
    }

    let generator = GeminiClient::from_config(&config).context("failed to build Gemini client")?;
    let state = Arc::new(AppState::new(&config, Arc::new(generator)));

    let app = routes::create_router().with_state(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    info!("emotion reply service running at http://{}", config.bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
