use anyhow::Result;
use axum::Router;
use axum::routing::get;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use huddle_server::config::ServerConfig;
use huddle_server::quiz::{GeminiGenerator, InMemoryQuizStore, QuizApi, quiz_router};
use huddle_server::registry::SessionRegistry;
use huddle_server::relay::{SignalRelay, ws_handler};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::parse();
    info!("starting huddle-server on {}", config.bind);

    let relay = SignalRelay::new(SessionRegistry::new());

    let mut app = Router::new()
        .route("/ws", get(ws_handler))
        .with_state(relay);

    match config.gemini_api_key {
        Some(api_key) => {
            let api = QuizApi {
                store: Arc::new(InMemoryQuizStore::new()),
                generator: Arc::new(GeminiGenerator::new(config.gemini_endpoint, api_key)),
            };
            app = app.merge(quiz_router(api));
        }
        None => warn!("GEMINI_API_KEY not set, quiz routes disabled"),
    }

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!("signaling relay listening on http://{}", config.bind);
    axum::serve(listener, app).await?;

    Ok(())
}
