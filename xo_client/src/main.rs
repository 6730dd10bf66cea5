//! Terminal client for the XO server.

use clap::Parser;
use std::io;
use tracing_subscriber::EnvFilter;

mod game_app;
mod game_service;

use game_app::GameApp;
use game_service::SessionClient;

#[derive(Debug, Parser)]
#[command(name = "xo", about = "Play tic-tac-toe against the XO server")]
struct Args {
    /// Base URL of the game server.
    #[arg(long, env = "XO_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let mut app = GameApp::new(SessionClient::new(args.server));
    app.run(io::stdin().lock(), io::stdout().lock())?;
    Ok(())
}
