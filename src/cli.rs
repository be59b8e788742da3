//! Command-line interface for gridmatch.

use clap::{Parser, Subcommand};

/// Gridmatch - match engine and session server for grid marking games
#[derive(Parser, Debug)]
#[command(name = "gridmatch")]
#[command(about = "Turn-based match engine for grid marking games", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the multiplayer session server
    Serve {
        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}
