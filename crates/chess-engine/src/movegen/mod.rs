//! Move generation.
//!
//! Candidates are produced square by square for the side to move, following
//! each piece's movement rule on the mailbox board. The legal list is the
//! candidate list with every move removed that would leave the mover's own
//! king attacked, tested on a copied position.
//!
//! Castling, en passant and promotion are not part of this rule set.

mod check;
mod list;
pub mod perft;

use crate::Position;
use chess_core::{Color, Direction, Move, Piece, Square};

pub use check::{in_check, is_king_attacked, CheckStatus};
pub use list::MoveList;

/// Knight jumps as an orthogonal step followed by a diagonal step, clockwise
/// from north-north-east.
const KNIGHT_JUMPS: [(Direction, Direction); 8] = [
    (Direction::North, Direction::NorthEast),
    (Direction::East, Direction::NorthEast),
    (Direction::East, Direction::SouthEast),
    (Direction::South, Direction::SouthEast),
    (Direction::South, Direction::SouthWest),
    (Direction::West, Direction::SouthWest),
    (Direction::West, Direction::NorthWest),
    (Direction::North, Direction::NorthWest),
];

/// Generates all legal moves for the side to move.
pub fn generate_legal(position: &Position) -> MoveList {
    let mut moves = generate_pseudo_legal(position);

    // Every candidate is checked on its own; the full count matters for
    // checkmate and stalemate detection.
    let us = position.side_to_move;
    moves.retain(|m| {
        let next = position.with_move(*m);
        !is_king_attacked(&next, us)
    });

    moves
}

/// Generates candidate moves for the side to move without the king-safety
/// filter.
pub fn generate_pseudo_legal(position: &Position) -> MoveList {
    let us = position.side_to_move;
    let mut moves = MoveList::new();

    for from in Square::all() {
        if let Some((piece, color)) = position.piece_at(from) {
            if color == us {
                let mut piece_moves = generate_piece_moves(position, from, piece, color);
                moves.append(&mut piece_moves);
            }
        }
    }

    moves
}

/// Generates candidate moves for the piece standing on `from`.
///
/// Returns an empty list when the square is empty or holds a piece of the
/// side not to move.
pub fn generate_moves_from(position: &Position, from: Square) -> MoveList {
    match position.piece_at(from) {
        Some((piece, color)) if color == position.side_to_move => {
            generate_piece_moves(position, from, piece, color)
        }
        _ => MoveList::new(),
    }
}

fn generate_piece_moves(position: &Position, from: Square, piece: Piece, color: Color) -> MoveList {
    let mut moves = MoveList::new();
    match piece {
        Piece::Pawn => generate_pawn_moves(position, from, color, &mut moves),
        Piece::Knight => generate_knight_moves(position, from, color, &mut moves),
        Piece::Bishop => generate_slides(position, from, color, &Direction::DIAGONAL, &mut moves),
        Piece::Rook => generate_slides(position, from, color, &Direction::ORTHOGONAL, &mut moves),
        Piece::Queen => {
            generate_slides(position, from, color, &Direction::DIAGONAL, &mut moves);
            generate_slides(position, from, color, &Direction::ORTHOGONAL, &mut moves);
        }
        Piece::King => generate_king_moves(position, from, color, &mut moves),
    }
    moves
}

/// Returns the number of legal moves for the side to move.
pub fn number_of_legal_moves(position: &Position) -> usize {
    generate_legal(position).len()
}

/// Returns true if `m` matches one of the legal moves by start and end square.
pub fn is_legal(position: &Position, m: Move) -> bool {
    generate_legal(position).contains(m)
}

/// Pawn pushes and diagonal captures.
fn generate_pawn_moves(position: &Position, from: Square, us: Color, moves: &mut MoveList) {
    let (forward, captures) = match us {
        Color::White => (
            Direction::North,
            [Direction::NorthWest, Direction::NorthEast],
        ),
        Color::Black => (
            Direction::South,
            [Direction::SouthWest, Direction::SouthEast],
        ),
    };

    if let Some(one) = from.step(forward).filter(|&sq| position.cell(sq).is_empty()) {
        moves.push(Move::new(from, one));

        if from.rank().index() == us.pawn_rank() {
            if let Some(two) = one.step(forward).filter(|&sq| position.cell(sq).is_empty()) {
                moves.push(Move::new(from, two));
            }
        }
    }

    for direction in captures {
        if let Some(to) = from.step(direction) {
            if position.cell(to).is_color(us.opposite()) {
                moves.push(Move::new(from, to));
            }
        }
    }
}

/// The eight knight jumps that land on the board and not on a friendly piece.
fn generate_knight_moves(position: &Position, from: Square, us: Color, moves: &mut MoveList) {
    for (first, second) in KNIGHT_JUMPS {
        if let Some(to) = from.step(first).and_then(|sq| sq.step(second)) {
            if !position.cell(to).is_color(us) {
                moves.push(Move::new(from, to));
            }
        }
    }
}

/// Slides along each direction until the edge, a friendly piece (excluded)
/// or an enemy piece (included, ends the slide).
fn generate_slides(
    position: &Position,
    from: Square,
    us: Color,
    directions: &[Direction],
    moves: &mut MoveList,
) {
    for &direction in directions {
        let mut next = from.step(direction);
        while let Some(to) = next {
            let cell = position.cell(to);
            if cell.is_color(us) {
                break;
            }
            moves.push(Move::new(from, to));
            if !cell.is_empty() {
                break;
            }
            next = to.step(direction);
        }
    }
}

/// One step in every direction; no castling.
fn generate_king_moves(position: &Position, from: Square, us: Color, moves: &mut MoveList) {
    for direction in Direction::ALL {
        if let Some(to) = from.step(direction) {
            if !position.cell(to).is_color(us) {
                moves.push(Move::new(from, to));
            }
        }
    }
}
