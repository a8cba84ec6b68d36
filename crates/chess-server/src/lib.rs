//! Multiplayer chess over plain TCP.
//!
//! Clients connect with any line-based tool (telnet, netcat) and land in a
//! lobby, where they can start a game, join one as the second player or as
//! a spectator, and list what is running. Each game runs in its own task and
//! validates every move with `chess-engine`.
//!
//! ```no_run
//! use chess_server::{Server, ServerConfig};
//!
//! # async fn serve() -> Result<(), chess_server::ServerError> {
//! let server = Server::bind(ServerConfig::default()).await?;
//! server.run(tokio::io::BufReader::new(tokio::io::stdin())).await
//! # }
//! ```

pub mod config;
pub mod connection;
mod hub;
pub mod protocol;
pub mod registry;
mod server;
pub mod session;

pub use config::{ConfigError, ServerConfig};
pub use connection::ConnId;
pub use registry::{GameSnapshot, Lobby, LobbySnapshot};
pub use server::{Server, ServerError, EXIT_COMMAND};
pub use session::{Ending, GameStatus};
