//! End-of-game rules.
//!
//! Only conditions detectable from the board itself are decided here:
//! checkmate and stalemate. Repetition, move-count and material draws are
//! not part of this rule set.

use crate::movegen::{is_king_attacked, number_of_legal_moves};
use crate::Position;
use chess_core::Color;
use std::fmt;

/// How a game ended on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The side to move has no legal moves and is in check.
    Checkmate { winner: Color },
    /// The side to move has no legal moves and is not in check.
    Stalemate,
}

impl Outcome {
    /// The winning side, if any.
    pub fn winner(self) -> Option<Color> {
        match self {
            Outcome::Checkmate { winner } => Some(winner),
            Outcome::Stalemate => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Checkmate { winner: Color::White } => f.write_str("White wins by checkmate!"),
            Outcome::Checkmate { winner: Color::Black } => f.write_str("Black wins by checkmate!"),
            Outcome::Stalemate => f.write_str("The game is drawn by stalemate."),
        }
    }
}

/// Decides whether the game is over for the side to move.
///
/// Returns `None` while the side to move has at least one legal move.
pub fn classify(position: &Position) -> Option<Outcome> {
    if number_of_legal_moves(position) > 0 {
        return None;
    }

    let mover = position.side_to_move;
    if is_king_attacked(position, mover) {
        Some(Outcome::Checkmate {
            winner: mover.opposite(),
        })
    } else {
        Some(Outcome::Stalemate)
    }
}

/// Returns true if the side to move is in check.
pub fn is_check(position: &Position) -> bool {
    is_king_attacked(position, position.side_to_move)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movegen::{in_check, CheckStatus};

    #[test]
    fn startpos_is_not_over() {
        assert_eq!(classify(&Position::startpos()), None);
        assert!(!is_check(&Position::startpos()));
    }

    #[test]
    fn corner_mate_with_protected_queen() {
        let pos = Position::from_fen("8/8/8/8/8/1k6/q7/K7 w").unwrap();
        assert_eq!(number_of_legal_moves(&pos), 0);
        assert_eq!(in_check(&pos), CheckStatus::WHITE);
        assert_eq!(
            classify(&pos),
            Some(Outcome::Checkmate {
                winner: Color::Black
            })
        );
    }

    #[test]
    fn unprotected_queen_can_be_taken() {
        // the black king on a8 does not cover a2
        let pos = Position::from_fen("k7/8/8/8/8/8/q7/K7 w").unwrap();
        assert!(is_check(&pos));
        assert_eq!(number_of_legal_moves(&pos), 1);
        assert_eq!(classify(&pos), None);
    }

    #[test]
    fn fools_mate() {
        let pos =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w").unwrap();
        let outcome = classify(&pos);
        assert_eq!(
            outcome,
            Some(Outcome::Checkmate {
                winner: Color::Black
            })
        );
        assert_eq!(outcome.and_then(Outcome::winner), Some(Color::Black));
    }

    #[test]
    fn back_rank_mate_for_white() {
        let pos = Position::from_fen("R5k1/5ppp/8/8/8/8/8/6K1 b").unwrap();
        let outcome = classify(&pos);
        assert_eq!(
            outcome,
            Some(Outcome::Checkmate {
                winner: Color::White
            })
        );
        assert_eq!(outcome.map(|o| o.to_string()).unwrap(), "White wins by checkmate!");
    }

    #[test]
    fn stalemate_for_black() {
        let pos = Position::from_fen("k7/8/1Q6/8/8/8/8/K7 b").unwrap();
        assert_eq!(in_check(&pos), CheckStatus::NONE);
        assert_eq!(number_of_legal_moves(&pos), 0);
        assert_eq!(classify(&pos), Some(Outcome::Stalemate));
        assert_eq!(Outcome::Stalemate.winner(), None);
    }
}
