//! Gridmatch - match engine and session server.

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use gridmatch::Coordinator;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { port, host } => run_server(host, port).await,
    }
}

/// Run the multiplayer session server
async fn run_server(host: String, port: u16) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    info!(port, "Starting gridmatch session server");

    let coordinator = Coordinator::new();
    gridmatch::server::serve(&host, port, coordinator).await
}
