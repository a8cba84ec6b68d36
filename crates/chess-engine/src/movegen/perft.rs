//! Exhaustive move-tree counting.
//!
//! The reference counts below depth 4 from the start contain no castling,
//! en passant or promotion, so they also hold for the reduced rule set.

use super::generate_legal;
use crate::Position;
use chess_core::Move;

/// Number of move sequences of exactly `depth` plies from `position`.
pub fn perft(position: &Position, depth: u32) -> u64 {
    match depth {
        0 => 1,
        1 => generate_legal(position).len() as u64,
        _ => generate_legal(position)
            .iter()
            .map(|&m| perft(&position.with_move(m), depth - 1))
            .sum(),
    }
}

/// [`perft`] split by root move, in coordinate order.
pub fn perft_divide(position: &Position, depth: u32) -> Vec<(Move, u64)> {
    let below = depth.saturating_sub(1);
    let mut split: Vec<(Move, u64)> = generate_legal(position)
        .iter()
        .map(|&m| (m, perft(&position.with_move(m), below)))
        .collect();
    split.sort_by_key(|(m, _)| m.to_coordinate());
    split
}
