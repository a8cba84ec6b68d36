//! Listening socket, connection admission and the operator console.

use crate::config::ServerConfig;
use crate::connection::Connection;
use crate::hub;
use crate::protocol;
use crate::registry::Lobby;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::net::{TcpListener, TcpStream};

/// Console line that shuts the server down.
pub const EXIT_COMMAND: &str = "!exit";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },

    #[error("failed to read listener address: {0}")]
    LocalAddr(#[source] io::Error),
}

/// A bound server, ready to run.
pub struct Server {
    listener: TcpListener,
    lobby: Arc<Lobby>,
}

impl Server {
    /// Binds the listening socket described by `config`.
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        let addr = config.addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;

        Ok(Server {
            listener,
            lobby: Arc::new(Lobby::new(config)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.listener.local_addr().map_err(ServerError::LocalAddr)
    }

    /// Shared registries, for inspection while the server runs.
    pub fn lobby(&self) -> Arc<Lobby> {
        Arc::clone(&self.lobby)
    }

    /// Accepts clients until the operator types `!exit` on `console`.
    ///
    /// Each accepted client is admitted by its own task, so a busy lobby
    /// never delays the console. The lobby hub runs alongside and is stopped
    /// on return. Game tasks are left to the runtime. A console that reaches
    /// end of input is ignored from then on.
    pub async fn run<R>(self, console: R) -> Result<(), ServerError>
    where
        R: AsyncBufRead + Unpin,
    {
        let addr = self.local_addr()?;
        tracing::info!("Chess server listening on {}", addr);

        let hub = tokio::spawn(hub::run(Arc::clone(&self.lobby)));
        let mut console = console.lines();
        let mut console_open = true;

        loop {
            tokio::select! {
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tokio::spawn(admit(Arc::clone(&self.lobby), stream, peer));
                    }
                    Err(e) => tracing::warn!("Accept failed: {}", e),
                },
                line = console.next_line(), if console_open => match line {
                    Ok(Some(line)) if line.trim_start().starts_with(EXIT_COMMAND) => {
                        tracing::info!("Exit requested from console");
                        break;
                    }
                    Ok(Some(line)) => tracing::debug!("Ignoring console input {:?}", line),
                    Ok(None) => {
                        tracing::debug!("Console closed");
                        console_open = false;
                    }
                    Err(e) => {
                        tracing::warn!("Console read failed: {}", e);
                        console_open = false;
                    }
                },
            }
        }

        hub.abort();
        Ok(())
    }
}

/// Puts a new client in the lobby, or turns it away if the lobby is full.
async fn admit(lobby: Arc<Lobby>, stream: TcpStream, peer: SocketAddr) {
    let mut conn = Connection::new(stream, peer);
    let mut connections = lobby.connections.lock().await;

    if connections.is_full() {
        tracing::info!("Turning away {} ({}): server full", conn.id(), peer);
        conn.send(protocol::SERVER_FULL).await;
        conn.close().await;
        return;
    }

    conn.send(protocol::ACCEPTED).await;
    tracing::info!("Accepted {} from {}", conn.id(), peer);
    match connections.insert(conn) {
        Ok(_) => lobby.arrivals.notify_one(),
        Err(mut conn) => {
            conn.send(protocol::SERVER_FULL).await;
            conn.close().await;
        }
    }
}
