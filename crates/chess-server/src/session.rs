//! Per-game session task.
//!
//! Each game runs as its own detached task. It sleeps until the second
//! player is seated, deals out the colors, then loops: take the game lock,
//! run at most one complete command, and if there was none release the lock
//! and wait briefly for any participant to send something. Every way a game
//! can end goes through [`SessionState::finish`].

use crate::connection::{self, Argument, ConnId, Connection, Input, Watch};
use crate::protocol::{self, PlayerCommand, SpectatorCommand};
use chess_core::{Color, Move, ParseMoveError};
use chess_engine::{render_board, Game, Outcome, Position};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

/// Lifecycle of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// One player seated, waiting for a second.
    Waiting,
    /// Both players seated; moves are being played.
    Ongoing,
    /// Over; the slot may be recycled.
    Completed,
}

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ending {
    Checkmate { winner: Color },
    Stalemate,
    Resignation { winner: Color },
    /// A player's connection closed mid-game.
    Disconnect { left: ConnId },
}

impl From<Outcome> for Ending {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Checkmate { winner } => Ending::Checkmate { winner },
            Outcome::Stalemate => Ending::Stalemate,
        }
    }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ending::Checkmate { winner } => write!(f, "{} wins by checkmate!", winner),
            Ending::Stalemate => f.write_str("The game is drawn by stalemate."),
            Ending::Resignation { winner } => write!(f, "{} wins by resignation.", winner),
            Ending::Disconnect { .. } => {
                f.write_str("Uh oh. Someone disconnected! The game is now over.")
            }
        }
    }
}

/// Result of one dispatched command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    End(Ending),
}

/// Who sent the input being handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Seat {
    Player(usize),
    Spectator(usize),
}

/// A game, its participants and the signal raised when someone joins.
pub struct Session {
    id: usize,
    state: Mutex<SessionState>,
    joined: Notify,
}

impl Session {
    /// Creates a waiting game with `first` in the first player seat.
    pub fn new(id: usize, first: Connection, max_spectators: usize) -> Self {
        Session {
            id,
            state: Mutex::new(SessionState {
                status: GameStatus::Waiting,
                game: Game::new(),
                players: vec![first],
                spectators: Vec::new(),
                max_spectators,
            }),
            joined: Notify::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn state(&self) -> &Mutex<SessionState> {
        &self.state
    }

    /// Wakes the game task after a player or spectator has been added, so
    /// it starts the game or starts watching the newcomer.
    pub fn signal_joined(&self) {
        self.joined.notify_one();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}

/// Everything guarded by a game's lock.
///
/// Once the game has started, the player in seat 0 plays white and the one
/// in seat 1 plays black.
#[derive(Debug)]
pub struct SessionState {
    status: GameStatus,
    game: Game,
    players: Vec<Connection>,
    spectators: Vec<Connection>,
    max_spectators: usize,
}

impl SessionState {
    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn position(&self) -> &Position {
        self.game.position()
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn spectator_count(&self) -> usize {
        self.spectators.len()
    }

    pub fn max_spectators(&self) -> usize {
        self.max_spectators
    }

    pub fn player_ids(&self) -> Vec<ConnId> {
        self.players.iter().map(Connection::id).collect()
    }

    pub fn spectator_ids(&self) -> Vec<ConnId> {
        self.spectators.iter().map(Connection::id).collect()
    }

    /// True while the game is unfinished and has a free spectator slot.
    pub fn can_spectate(&self) -> bool {
        self.status != GameStatus::Completed && self.spectators.len() < self.max_spectators
    }

    /// Seats the second player and moves the game to `Ongoing`.
    ///
    /// Hands the connection back if the game is not waiting for a player.
    pub fn seat_second_player(&mut self, conn: Connection) -> Result<(), Connection> {
        if self.status != GameStatus::Waiting || self.players.len() != 1 {
            return Err(conn);
        }
        self.players.push(conn);
        self.status = GameStatus::Ongoing;
        Ok(())
    }

    /// Adds a spectator, handing the connection back if there is no room.
    pub fn add_spectator(&mut self, conn: Connection) -> Result<(), Connection> {
        if !self.can_spectate() {
            return Err(conn);
        }
        self.spectators.push(conn);
        Ok(())
    }

    pub(crate) fn mark_completed(&mut self) {
        self.status = GameStatus::Completed;
    }

    fn seat_color(index: usize) -> Color {
        Color::ALL[index]
    }

    /// Deals out the colors and announces the start.
    async fn start(&mut self) {
        if rand::random::<bool>() {
            self.players.swap(0, 1);
        }

        self.broadcast_board().await;
        for (index, player) in self.players.iter_mut().enumerate() {
            let text = match Self::seat_color(index) {
                Color::White => protocol::STARTED_WHITE,
                Color::Black => protocol::STARTED_BLACK,
            };
            player.send(text).await;
        }
        for spectator in &mut self.spectators {
            spectator.send(protocol::STARTED_SPECTATOR).await;
        }
    }

    /// Sends each player the board from their side; spectators see white's
    /// view.
    async fn broadcast_board(&mut self) {
        let position = self.game.position();
        for (index, player) in self.players.iter_mut().enumerate() {
            let board = render_board(position, Self::seat_color(index));
            player.send(&board).await;
        }
        if !self.spectators.is_empty() {
            let board = render_board(position, Color::White);
            for spectator in &mut self.spectators {
                spectator.send(&board).await;
            }
        }
    }

    /// The first participant, players before spectators, with a complete
    /// line or a hang-up to handle.
    fn ready_seat(&mut self) -> Option<Seat> {
        let mut ready = |conn: &mut Connection| {
            conn.fill();
            conn.has_input()
        };
        if let Some(index) = self.players.iter_mut().position(&mut ready) {
            return Some(Seat::Player(index));
        }
        self.spectators
            .iter_mut()
            .position(&mut ready)
            .map(Seat::Spectator)
    }

    fn watches(&self) -> Vec<Watch> {
        self.players
            .iter()
            .chain(&self.spectators)
            .map(Connection::watch)
            .collect()
    }

    async fn dispatch(&mut self, seat: Seat) -> Flow {
        match seat {
            Seat::Player(index) => self.player_command(index).await,
            Seat::Spectator(index) => {
                self.spectator_command(index).await;
                Flow::Continue
            }
        }
    }

    async fn player_command(&mut self, index: usize) -> Flow {
        let left = self.players[index].id();
        let line = match self.players[index].next_input() {
            Some(Input::Line(line)) => line,
            Some(Input::Closed) => return Flow::End(Ending::Disconnect { left }),
            None => return Flow::Continue,
        };

        let (command, argument) = protocol::split_command(&line);
        match PlayerCommand::parse(command) {
            PlayerCommand::Move => self.command_move(index, argument).await,
            PlayerCommand::ListMoves => {
                self.command_list_moves(index).await;
                Flow::Continue
            }
            PlayerCommand::Message => self.command_message(index, argument).await,
            PlayerCommand::Resign => Flow::End(Ending::Resignation {
                winner: Self::seat_color(index).opposite(),
            }),
            PlayerCommand::Other => {
                debug!("Ignoring player command {:?} from {}", command, left);
                Flow::Continue
            }
        }
    }

    async fn command_move(&mut self, index: usize, argument: &str) -> Flow {
        let player = &mut self.players[index];
        let text = match player.argument(argument) {
            Argument::Present(text) => text,
            Argument::Missing => {
                player.send(protocol::MOVE_MISSING).await;
                return Flow::Continue;
            }
            Argument::Disconnected => {
                return Flow::End(Ending::Disconnect { left: player.id() })
            }
        };

        let m = match Move::from_coordinate(&text) {
            Ok(m) => m,
            Err(ParseMoveError::TooShort(_)) => {
                player.send(protocol::MOVE_UNREADABLE).await;
                return Flow::Continue;
            }
            Err(ParseMoveError::InvalidSquare(_)) => {
                player.send(protocol::MOVE_INVALID).await;
                return Flow::Continue;
            }
        };

        if Self::seat_color(index) != self.game.position().side_to_move {
            player.send(protocol::NOT_YOUR_TURN).await;
            return Flow::Continue;
        }

        if let Err(e) = self.game.play(m) {
            debug!("Rejected move from {}: {}", player.id(), e);
            player.send(protocol::ILLEGAL_MOVE).await;
            return Flow::Continue;
        }

        self.broadcast_board().await;

        match self.game.outcome() {
            Some(outcome) => Flow::End(outcome.into()),
            None => Flow::Continue,
        }
    }

    async fn command_list_moves(&mut self, index: usize) {
        let mut text = String::from(protocol::LEGAL_MOVES_HEADER);
        for m in self.game.legal_moves() {
            text.push_str(&m.to_coordinate());
            text.push('\n');
        }
        text.push(protocol::LIST_TERMINATOR);
        self.players[index].send(&text).await;
    }

    async fn command_message(&mut self, index: usize, argument: &str) -> Flow {
        let sender = &mut self.players[index];
        let text = match sender.argument(argument) {
            Argument::Present(text) => text,
            Argument::Missing => return Flow::Continue,
            Argument::Disconnected => {
                return Flow::End(Ending::Disconnect { left: sender.id() })
            }
        };

        let line = protocol::chat_line(Self::seat_color(index).tag(), &text);
        for (other, player) in self.players.iter_mut().enumerate() {
            if other != index {
                player.send(&line).await;
            }
        }
        for spectator in &mut self.spectators {
            spectator.send(&line).await;
        }
        Flow::Continue
    }

    async fn spectator_command(&mut self, index: usize) {
        let line = match self.spectators[index].next_input() {
            Some(Input::Line(line)) => line,
            Some(Input::Closed) => {
                let gone = self.spectators.remove(index);
                debug!("Spectator {} left", gone.id());
                gone.close().await;
                return;
            }
            None => return,
        };

        let (command, _) = protocol::split_command(&line);
        match SpectatorCommand::parse(command) {
            SpectatorCommand::Disconnect => {
                let mut gone = self.spectators.remove(index);
                gone.send(protocol::DISCONNECTED).await;
                gone.close().await;
            }
            SpectatorCommand::Unknown => {
                self.spectators[index].send(protocol::UNRECOGNIZED).await;
            }
        }
    }

    /// Marks the game completed, announces `ending` and closes every
    /// connection in the game.
    async fn finish(&mut self, ending: Ending) {
        self.status = GameStatus::Completed;

        let left = match ending {
            Ending::Disconnect { left } => Some(left),
            _ => None,
        };
        let text = format!("{}\n", ending);

        let everyone = self.players.drain(..).chain(self.spectators.drain(..));
        for mut conn in everyone {
            if Some(conn.id()) != left {
                conn.send(&text).await;
            }
            conn.close().await;
        }
    }
}

/// Runs one game from the second player's arrival to its end.
pub async fn run(session: Arc<Session>, poll_timeout: Duration) {
    loop {
        if session.state.lock().await.status != GameStatus::Waiting {
            break;
        }
        session.joined.notified().await;
    }

    session.state.lock().await.start().await;
    info!("Game {} started", session.id);

    loop {
        let watches = {
            let mut state = session.state.lock().await;
            match state.ready_seat() {
                Some(seat) => {
                    if let Flow::End(ending) = state.dispatch(seat).await {
                        state.finish(ending).await;
                        info!("Game {} over: {}", session.id, ending);
                        return;
                    }
                    continue;
                }
                None => state.watches(),
            }
        };
        tokio::select! {
            _ = connection::wait_readable(watches, poll_timeout) => {}
            _ = session.joined.notified() => {}
        }
    }
}
