//! Chess server binary.
//!
//! Type `!exit` on standard input to shut it down.

use chess_server::{Server, ServerConfig};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::Level;

/// Multiplayer chess server for line-based TCP clients.
#[derive(Parser)]
#[command(name = "chess-server")]
#[command(about = "Hosts chess games for telnet-style clients")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "chess-server.toml")]
    config: PathBuf,

    /// Port to listen on, overriding the configuration file
    #[arg(long)]
    port: Option<u16>,

    /// Log at debug level
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();

    let mut config = ServerConfig::load(&args.config)?;
    if let Some(port) = args.port {
        config.port = port;
    }
    tracing::info!(
        "Limits: {} connections, {} games, {} spectators per game",
        config.max_connections,
        config.max_games,
        config.max_spectators
    );

    let server = Server::bind(config).await?;
    server.run(BufReader::new(tokio::io::stdin())).await?;

    tracing::info!("Shutting down");
    // Game tasks and the blocking stdin reader would otherwise keep the
    // runtime alive.
    std::process::exit(0);
}
