//! Move representation.

use crate::{ParseSquareError, Square};
use std::fmt;
use thiserror::Error;

/// Errors from parsing coordinate notation such as `e2e4`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMoveError {
    /// Fewer than four characters were supplied.
    #[error("expected four characters, got {0}")]
    TooShort(usize),
    /// One of the two halves is not a square.
    #[error(transparent)]
    InvalidSquare(#[from] ParseSquareError),
}

/// A chess move: the piece on `from` travels to `to`.
///
/// Moves carry no flags. Captures are implied by the destination being
/// occupied; castling, en passant and promotion are not part of the rules.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
}

impl Move {
    /// Creates a new move.
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Move { from, to }
    }

    /// Returns the source square.
    #[inline]
    pub const fn from(self) -> Square {
        self.from
    }

    /// Returns the destination square.
    #[inline]
    pub const fn to(self) -> Square {
        self.to
    }

    /// Returns the four-character coordinate notation (e.g., "e2e4").
    pub fn to_coordinate(self) -> String {
        format!("{}{}", self.from, self.to)
    }

    /// Parses a move from the first four characters of `s`.
    ///
    /// Anything after the fourth character is ignored, matching how a
    /// client line like `e2e4` followed by a newline is consumed.
    pub fn from_coordinate(s: &str) -> Result<Self, ParseMoveError> {
        let chars: Vec<char> = s.chars().take(4).collect();
        if chars.len() < 4 {
            return Err(ParseMoveError::TooShort(chars.len()));
        }
        let from: String = chars[0..2].iter().collect();
        let to: String = chars[2..4].iter().collect();
        Ok(Move::new(from.parse()?, to.parse()?))
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Move({})", self.to_coordinate())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)
    }
}
