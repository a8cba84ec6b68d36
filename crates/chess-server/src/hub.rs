//! The lobby hub: reads commands from connections that are not in a game.
//!
//! Each cycle takes the connection registry lock, runs at most one complete
//! command, and releases the lock again before waiting for more input. The
//! acceptor gets in between cycles and cuts the wait short when it admits
//! someone new.

use crate::connection::{self, Argument, Input};
use crate::protocol::{self, LobbyCommand};
use crate::registry::{ConnectionRegistry, GameRegistry, Lobby};
use crate::session::{self, GameStatus, Session};
use chess_core::Color;
use chess_engine::render_board;
use std::sync::Arc;
use tracing::{debug, info};

/// Serves lobby commands forever.
pub async fn run(lobby: Arc<Lobby>) {
    let poll_timeout = lobby.config().poll_timeout();
    info!("Hub ready");

    loop {
        let watches = {
            let mut connections = lobby.connections.lock().await;
            if let Some(slot) = connections.ready_slot() {
                handle_command(&lobby, &mut connections, slot).await;
                continue;
            }
            connections.watches()
        };
        tokio::select! {
            _ = connection::wait_readable(watches, poll_timeout) => {}
            _ = lobby.arrivals.notified() => {}
        }
    }
}

/// Runs one command from the connection in `slot`, if a whole one has
/// arrived.
async fn handle_command(lobby: &Lobby, connections: &mut ConnectionRegistry, slot: usize) {
    let input = match connections.get_mut(slot) {
        Some(conn) => conn.next_input(),
        None => return,
    };
    let line = match input {
        Some(Input::Line(line)) => line,
        Some(Input::Closed) => {
            if let Some(conn) = connections.take(slot) {
                debug!("{} left the lobby", conn.id());
            }
            return;
        }
        None => return,
    };

    let (command, argument) = protocol::split_command(&line);
    match LobbyCommand::parse(command) {
        LobbyCommand::NewGame => new_game(lobby, connections, slot).await,
        LobbyCommand::JoinPlay => join_play(lobby, connections, slot, argument).await,
        LobbyCommand::JoinSpec => join_spec(lobby, connections, slot, argument).await,
        LobbyCommand::ListGames => list_games(lobby, connections, slot).await,
        LobbyCommand::Disconnect => {
            if let Some(mut conn) = connections.take(slot) {
                conn.send(protocol::DISCONNECTED).await;
                info!("{} disconnected", conn.id());
                conn.close().await;
            }
        }
        LobbyCommand::Help => connections.send(slot, protocol::LOBBY_HELP).await,
        LobbyCommand::Unknown => {
            debug!("Unrecognized lobby command {:?}", command);
            connections.send(slot, protocol::UNRECOGNIZED).await;
        }
    }
}

/// Starts a game in the first free or completed slot with the caller as its
/// first player.
async fn new_game(lobby: &Lobby, connections: &mut ConnectionRegistry, slot: usize) {
    let mut games = lobby.games.lock().await;

    let id = match games.free_slot().await {
        Some(id) => id,
        None => {
            connections.send(slot, protocol::TOO_MANY_GAMES).await;
            return;
        }
    };
    let mut conn = match connections.take(slot) {
        Some(conn) => conn,
        None => return,
    };

    conn.send(protocol::GAME_CREATED).await;
    info!("{} created game {}", conn.id(), id);

    let session = Arc::new(Session::new(id, conn, lobby.config().max_spectators));
    games.install(Arc::clone(&session));
    tokio::spawn(session::run(session, lobby.config().poll_timeout()));
}

/// Seats the caller as the second player of a waiting game.
async fn join_play(
    lobby: &Lobby,
    connections: &mut ConnectionRegistry,
    slot: usize,
    argument: &str,
) {
    let games = lobby.games.lock().await;

    let id = match resolve_id(connections, slot, argument) {
        Some(Argument::Present(text)) => match protocol::parse_game_id(&text, games.capacity()) {
            Ok(id) => id,
            Err(e) => {
                debug!("joinplay: {}", e);
                connections.send(slot, protocol::BAD_NUMBER).await;
                return;
            }
        },
        Some(Argument::Missing) => match games.first_waiting().await {
            Some(id) => id,
            None => {
                connections.send(slot, protocol::NO_WAITING_GAME).await;
                return;
            }
        },
        Some(Argument::Disconnected) | None => return,
    };

    let session = match games.get(id) {
        Some(session) => session,
        None => {
            connections.send(slot, protocol::NO_SUCH_GAME).await;
            return;
        }
    };

    let mut state = session.state().lock().await;
    if state.status() != GameStatus::Waiting {
        connections.send(slot, protocol::NOT_WAITING).await;
        return;
    }

    if let Some(conn) = connections.take(slot) {
        let joined = conn.id();
        match state.seat_second_player(conn) {
            Ok(()) => {
                info!("{} joined game {}", joined, id);
                session.signal_joined();
            }
            Err(mut conn) => {
                conn.send(protocol::NOT_WAITING).await;
                let _ = connections.insert(conn);
            }
        }
    }
}

/// Adds the caller to a game's spectators.
async fn join_spec(
    lobby: &Lobby,
    connections: &mut ConnectionRegistry,
    slot: usize,
    argument: &str,
) {
    let games = lobby.games.lock().await;

    let id = match resolve_id(connections, slot, argument) {
        Some(Argument::Present(text)) => match protocol::parse_game_id(&text, games.capacity()) {
            Ok(id) => id,
            Err(e) => {
                debug!("joinspec: {}", e);
                connections.send(slot, protocol::BAD_NUMBER).await;
                return;
            }
        },
        Some(Argument::Missing) => {
            connections.send(slot, protocol::SPECTATE_NEEDS_ID).await;
            return;
        }
        Some(Argument::Disconnected) | None => return,
    };

    let session = match games.get(id) {
        Some(session) => session,
        None => {
            connections.send(slot, protocol::NO_SUCH_GAME).await;
            return;
        }
    };

    let mut state = session.state().lock().await;
    if state.status() == GameStatus::Completed {
        connections.send(slot, protocol::GAME_FINISHED).await;
        return;
    }
    if !state.can_spectate() {
        connections.send(slot, protocol::TOO_MANY_SPECTATORS).await;
        return;
    }

    if let Some(mut conn) = connections.take(slot) {
        conn.send(&protocol::spectating(id)).await;
        conn.send(&render_board(state.position(), Color::White)).await;
        info!("{} is spectating game {}", conn.id(), id);
        match state.add_spectator(conn) {
            Ok(()) => session.signal_joined(),
            Err(conn) => {
                let _ = connections.insert(conn);
            }
        }
    }
}

/// Fetches the id argument for a join command.
///
/// A hang-up in place of the next line removes the caller from the lobby
/// and yields `Some(Argument::Disconnected)`.
fn resolve_id(
    connections: &mut ConnectionRegistry,
    slot: usize,
    argument: &str,
) -> Option<Argument> {
    let resolved = connections.get_mut(slot)?.argument(argument);
    if resolved == Argument::Disconnected {
        if let Some(conn) = connections.take(slot) {
            debug!("{} left the lobby", conn.id());
        }
    }
    Some(resolved)
}

async fn list_games(lobby: &Lobby, connections: &mut ConnectionRegistry, slot: usize) {
    let games = lobby.games.lock().await;
    let text = game_listing(&games).await;
    connections.send(slot, &text).await;
}

/// The header plus one line per occupied game slot.
async fn game_listing(games: &GameRegistry) -> String {
    let mut text = String::from(protocol::GAME_LIST_HEADER);
    for session in games.iter() {
        let state = session.state().lock().await;
        text.push_str(&protocol::game_list_line(
            session.id(),
            state.player_count(),
            state.spectator_count(),
            state.max_spectators(),
        ));
    }
    text
}
