//! Core types for chess.
//!
//! This crate provides the fundamental types shared by the engine and the server:
//! - [`Piece`], [`Color`] and [`Cell`] for board contents
//! - [`Square`], [`File`], [`Rank`] and [`Direction`] for board geometry
//! - [`Move`] for a piece travelling from one square to another
//! - FEN piece-placement parsing

mod color;
mod fen;
mod mov;
mod piece;
mod square;

pub use color::Color;
pub use fen::{FenError, FenParser};
pub use mov::{Move, ParseMoveError};
pub use piece::{Cell, Piece};
pub use square::{Direction, File, ParseSquareError, Rank, Square};
