//! XO game server.
//!
//! Holds one tic-tac-toe session against a self-trained opponent.
//! Endpoints:
//! - GET  /health - liveness probe
//! - GET  /state  - current session snapshot
//! - POST /reset  - `{"human": "X"|"O"}`, start over
//! - POST /move   - `{"pos": 0..8}`, human move plus opponent reply

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod error;
mod game;

use app_state::AppState;
use config::Config;
use game::agent::TrainedOpponent;
use game::handlers::{get_state, health, make_move, reset_game};
use game::session::GameSession;

pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/state", get(get_state))
        .route("/reset", post(reset_game))
        .route("/move", post(make_move))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, stopping server...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    info!(
        "Training opponent with {} self-play episodes (seed: {:?})",
        config.training_episodes, config.seed
    );

    let (episodes, seed) = (config.training_episodes, config.seed);
    let opponent =
        tokio::task::spawn_blocking(move || TrainedOpponent::train(episodes, seed)).await?;

    let app_state = Arc::new(AppState::new(GameSession::new(Box::new(opponent))));
    let app = create_app(app_state);

    let listener = TcpListener::bind(config.addr()).await?;
    info!("Server is running on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down gracefully");
    Ok(())
}
