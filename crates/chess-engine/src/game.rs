//! Game management with move history.
//!
//! The [`Game`] struct keeps the starting position and every move played, so
//! the previous position can always be rebuilt by replaying the history.

use crate::movegen::{generate_legal, is_legal};
use crate::rules::{classify, is_check, Outcome};
use crate::{MoveList, Position};
use chess_core::Move;
use thiserror::Error;

/// Error type for game operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// The move is not legal in the current position.
    #[error("illegal move: {0}")]
    IllegalMove(Move),
    /// The game has already ended.
    #[error("game has already ended")]
    GameAlreadyOver,
}

/// A chess game with history tracking.
#[derive(Debug, Clone)]
pub struct Game {
    /// Starting position.
    start: Position,
    /// Current position.
    position: Position,
    /// Moves played from the starting position.
    history: Vec<Move>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Creates a new game with the standard starting position.
    pub fn new() -> Self {
        Self::from_position(Position::startpos())
    }

    /// Creates a game from a custom starting position.
    pub fn from_position(position: Position) -> Self {
        Game {
            start: position.clone(),
            position,
            history: Vec::new(),
        }
    }

    /// Creates a game from a FEN string.
    pub fn from_fen(fen: &str) -> Result<Self, chess_core::FenError> {
        let position = Position::from_fen(fen)?;
        Ok(Self::from_position(position))
    }

    /// Returns a reference to the current position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Returns the starting position.
    pub fn start_position(&self) -> &Position {
        &self.start
    }

    /// Returns the moves played so far, oldest first.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    /// Returns the number of half-moves (plies) played.
    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    /// Returns all legal moves in the current position.
    pub fn legal_moves(&self) -> MoveList {
        generate_legal(&self.position)
    }

    /// Returns true if the side to move is in check.
    pub fn is_check(&self) -> bool {
        is_check(&self.position)
    }

    /// Returns the outcome if the side to move has no legal moves.
    pub fn outcome(&self) -> Option<Outcome> {
        classify(&self.position)
    }

    /// Plays a move after checking it against the legal moves.
    pub fn play(&mut self, m: Move) -> Result<(), GameError> {
        if self.outcome().is_some() {
            return Err(GameError::GameAlreadyOver);
        }
        if !is_legal(&self.position, m) {
            return Err(GameError::IllegalMove(m));
        }

        self.position.apply_move(m);
        self.history.push(m);
        Ok(())
    }

    /// Takes back the last move, returning it.
    ///
    /// The position is rebuilt by replaying the remaining history from the
    /// starting position.
    pub fn undo(&mut self) -> Option<Move> {
        let last = self.history.pop()?;

        let mut position = self.start.clone();
        for &m in &self.history {
            position.apply_move(m);
        }
        self.position = position;

        Some(last)
    }

    /// Returns the current position as a FEN string.
    pub fn to_fen(&self) -> String {
        self.position.to_fen()
    }
}
