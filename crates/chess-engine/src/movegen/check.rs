//! Check detection.

use super::generate_pseudo_legal;
use crate::Position;
use chess_core::Color;
use std::fmt;

/// Which kings are currently attacked.
///
/// A flag set: `WHITE` and `BLACK` may both be present, which only happens
/// on a board that no legal game can reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CheckStatus(u8);

impl CheckStatus {
    pub const NONE: CheckStatus = CheckStatus(0);
    pub const WHITE: CheckStatus = CheckStatus(1);
    pub const BLACK: CheckStatus = CheckStatus(2);
    pub const BOTH: CheckStatus = CheckStatus(3);

    /// The status with only `color`'s king attacked.
    pub const fn of(color: Color) -> CheckStatus {
        match color {
            Color::White => CheckStatus::WHITE,
            Color::Black => CheckStatus::BLACK,
        }
    }

    /// Returns true if `color`'s king is attacked.
    pub const fn contains(self, color: Color) -> bool {
        self.0 & CheckStatus::of(color).0 != 0
    }

    /// Returns true if no king is attacked.
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for CheckStatus {
    type Output = CheckStatus;

    fn bitor(self, rhs: CheckStatus) -> CheckStatus {
        CheckStatus(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for CheckStatus {
    fn bitor_assign(&mut self, rhs: CheckStatus) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match *self {
            CheckStatus::NONE => "none",
            CheckStatus::WHITE => "white",
            CheckStatus::BLACK => "black",
            _ => "both",
        };
        f.write_str(label)
    }
}

/// Reports which kings are attacked, regardless of whose turn it is.
///
/// # Panics
///
/// Panics if either king is missing from the board.
pub fn in_check(position: &Position) -> CheckStatus {
    let mut status = CheckStatus::NONE;
    for color in Color::ALL {
        if is_king_attacked(position, color) {
            status |= CheckStatus::of(color);
        }
    }
    status
}

/// Returns true if any opposing piece has a candidate move onto the king of
/// `color`.
///
/// Candidate moves are used without the king-safety filter: a pinned piece
/// still gives check.
///
/// # Panics
///
/// Panics if the king of `color` is missing from the board.
pub fn is_king_attacked(position: &Position, color: Color) -> bool {
    let king = position.king_square(color);

    let mut attacker_view = position.clone();
    attacker_view.side_to_move = color.opposite();

    generate_pseudo_legal(&attacker_view)
        .iter()
        .any(|m| m.to() == king)
}
