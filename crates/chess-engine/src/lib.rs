//! Chess rules engine on a mailbox board.
//!
//! This crate provides:
//! - [`Position`] - 64 cells plus the side to move
//! - [`MoveList`] - the ordered move container produced by the generator
//! - Move generation, legality filtering and check detection in [`movegen`]
//! - Checkmate and stalemate classification in [`rules`]
//! - [`Game`] - a position with its move history and undo
//! - [`render_board`] - fixed-size text board for either side
//!
//! # Architecture
//!
//! Each square holds a [`Cell`](chess_core::Cell). Candidate moves follow the
//! piece movement rules square by square; a candidate is legal when the
//! mover's king is not attacked on a copy of the position with the move
//! applied. Castling, en passant and promotion are not played.
//!
//! # Example
//!
//! ```
//! use chess_engine::{generate_legal, Game, Position};
//! use chess_core::Move;
//!
//! let position = Position::startpos();
//! assert_eq!(generate_legal(&position).len(), 20);
//!
//! let mut game = Game::new();
//! game.play(Move::from_coordinate("e2e4").unwrap()).unwrap();
//! game.play(Move::from_coordinate("e7e5").unwrap()).unwrap();
//! println!("Position after 1.e4 e5: {}", game.to_fen());
//! ```

mod game;
pub mod movegen;
mod position;
pub mod render;
pub mod rules;

pub use game::{Game, GameError};
pub use movegen::{
    generate_legal, generate_moves_from, generate_pseudo_legal, in_check, is_king_attacked,
    is_legal, number_of_legal_moves, CheckStatus, MoveList,
};
pub use position::Position;
pub use render::{render_board, BOARD_TEXT_LEN};
pub use rules::{classify, Outcome};
