//! Fixed-capacity slot tables for lobby connections and games.
//!
//! Both tables live in the [`Lobby`], each behind its own lock. When more
//! than one lock is needed they are taken in a fixed order: connections,
//! then games, then a single game's session state.

use crate::config::ServerConfig;
use crate::connection::{ConnId, Connection, Watch};
use crate::session::{GameStatus, Session};
use chess_engine::Position;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

/// Connections that are in the lobby, not attached to any game.
#[derive(Debug)]
pub struct ConnectionRegistry {
    slots: Vec<Option<Connection>>,
}

impl ConnectionRegistry {
    pub fn new(capacity: usize) -> Self {
        ConnectionRegistry {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Places a connection in the first free slot.
    ///
    /// Hands the connection back if every slot is taken.
    pub fn insert(&mut self, conn: Connection) -> Result<usize, Connection> {
        match self.slots.iter().position(Option::is_none) {
            Some(slot) => {
                self.slots[slot] = Some(conn);
                Ok(slot)
            }
            None => Err(conn),
        }
    }

    pub fn get_mut(&mut self, slot: usize) -> Option<&mut Connection> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Removes the connection in `slot`, giving ownership to the caller.
    pub fn take(&mut self, slot: usize) -> Option<Connection> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Writes to the connection in `slot`, if there is one.
    pub async fn send(&mut self, slot: usize, text: &str) {
        if let Some(conn) = self.get_mut(slot) {
            conn.send(text).await;
        }
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.ids().any(|c| c == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = ConnId> + '_ {
        self.slots.iter().flatten().map(Connection::id)
    }

    /// Reads what each lobby connection has sent so far and returns the
    /// first slot with a complete line or a hang-up to handle.
    pub fn ready_slot(&mut self) -> Option<usize> {
        self.slots.iter_mut().position(|entry| match entry {
            Some(conn) => {
                conn.fill();
                conn.has_input()
            }
            None => false,
        })
    }

    /// Handles for waiting on every lobby connection without the lock.
    pub fn watches(&self) -> Vec<Watch> {
        self.slots.iter().flatten().map(Connection::watch).collect()
    }
}

/// Games by id; the id is the slot index.
#[derive(Debug)]
pub struct GameRegistry {
    slots: Vec<Option<Arc<Session>>>,
}

impl GameRegistry {
    pub fn new(capacity: usize) -> Self {
        GameRegistry {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn get(&self, id: usize) -> Option<&Arc<Session>> {
        self.slots.get(id).and_then(Option::as_ref)
    }

    /// Finds a slot for a new game: the first one that is empty or holds a
    /// completed game.
    pub async fn free_slot(&self) -> Option<usize> {
        for (id, slot) in self.slots.iter().enumerate() {
            match slot {
                None => return Some(id),
                Some(session) => {
                    if session.state().lock().await.status() == GameStatus::Completed {
                        return Some(id);
                    }
                }
            }
        }
        None
    }

    /// The lowest id whose game still waits for its second player.
    pub async fn first_waiting(&self) -> Option<usize> {
        for (id, slot) in self.slots.iter().enumerate() {
            if let Some(session) = slot {
                if session.state().lock().await.status() == GameStatus::Waiting {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Puts `session` into its slot, dropping any completed game held there.
    pub fn install(&mut self, session: Arc<Session>) {
        let id = session.id();
        if let Some(slot) = self.slots.get_mut(id) {
            if slot.is_some() {
                tracing::debug!("Recycling slot of completed game {}", id);
            }
            *slot = Some(session);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Session>> {
        self.slots.iter().flatten()
    }
}

/// State shared by the acceptor, the hub and every game.
#[derive(Debug)]
pub struct Lobby {
    pub(crate) connections: Mutex<ConnectionRegistry>,
    pub(crate) games: Mutex<GameRegistry>,
    /// Raised when a connection enters the lobby from outside the hub.
    pub(crate) arrivals: Notify,
    config: ServerConfig,
}

impl Lobby {
    pub fn new(config: ServerConfig) -> Self {
        Lobby {
            connections: Mutex::new(ConnectionRegistry::new(config.max_connections)),
            games: Mutex::new(GameRegistry::new(config.max_games)),
            arrivals: Notify::new(),
            config,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// A consistent copy of who is where, taken under all locks.
    pub async fn snapshot(&self) -> LobbySnapshot {
        let connections = self.connections.lock().await;
        let games = self.games.lock().await;

        let mut snapshot = LobbySnapshot {
            lobby: connections.ids().collect(),
            games: Vec::new(),
        };
        for session in games.iter() {
            let state = session.state().lock().await;
            snapshot.games.push(GameSnapshot {
                id: session.id(),
                status: state.status(),
                players: state.player_ids(),
                spectators: state.spectator_ids(),
                position: state.position().clone(),
            });
        }
        snapshot
    }
}

/// Copy of the registries at one instant.
#[derive(Debug, Clone)]
pub struct LobbySnapshot {
    /// Connections in the lobby.
    pub lobby: Vec<ConnId>,
    pub games: Vec<GameSnapshot>,
}

#[derive(Debug, Clone)]
pub struct GameSnapshot {
    pub id: usize,
    pub status: GameStatus,
    pub players: Vec<ConnId>,
    pub spectators: Vec<ConnId>,
    pub position: Position,
}

impl LobbySnapshot {
    /// Every connection id in the snapshot, wherever it sits.
    pub fn all_ids(&self) -> Vec<ConnId> {
        let mut ids = self.lobby.clone();
        for game in &self.games {
            ids.extend(&game.players);
            ids.extend(&game.spectators);
        }
        ids
    }

    pub fn game(&self, id: usize) -> Option<&GameSnapshot> {
        self.games.iter().find(|g| g.id == id)
    }
}
