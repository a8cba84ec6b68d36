//! FEN (Forsyth-Edwards Notation) piece-placement parsing.
//!
//! Only the placement and active-color fields carry meaning for this rule
//! set. Castling, en passant and clock fields may be present and are skipped.

use crate::{Cell, Color, Piece, Square};
use thiserror::Error;

/// Errors that can occur when parsing FEN strings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("invalid FEN: expected 1 to 6 fields, got {0}")]
    InvalidPartCount(usize),

    #[error("invalid piece placement: {0}")]
    InvalidPiecePlacement(String),

    #[error("invalid active color: expected 'w' or 'b', got '{0}'")]
    InvalidActiveColor(String),
}

/// Parsed FEN data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenParser {
    /// Board contents indexed by square (a1 = 0).
    pub cells: [Cell; 64],
    /// The side to move; white when the field is absent.
    pub side_to_move: Color,
}

impl FenParser {
    /// The standard starting position FEN.
    pub const STARTPOS: &'static str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w - - 0 1";

    /// Parses a FEN string.
    pub fn parse(fen: &str) -> Result<Self, FenError> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.is_empty() || parts.len() > 6 {
            return Err(FenError::InvalidPartCount(parts.len()));
        }

        let cells = Self::parse_piece_placement(parts[0])?;

        let side_to_move = match parts.get(1).copied() {
            None | Some("w") => Color::White,
            Some("b") => Color::Black,
            Some(other) => return Err(FenError::InvalidActiveColor(other.to_string())),
        };

        Ok(FenParser {
            cells,
            side_to_move,
        })
    }

    fn parse_piece_placement(placement: &str) -> Result<[Cell; 64], FenError> {
        let ranks: Vec<&str> = placement.split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::InvalidPiecePlacement(format!(
                "expected 8 ranks, got {}",
                ranks.len()
            )));
        }

        let mut cells = [Cell::EMPTY; 64];
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - i as u8; // FEN starts from rank 8
            let mut file = 0u8;
            for c in rank_str.chars() {
                if let Some(skip) = c.to_digit(10).filter(|d| (1..=8).contains(d)) {
                    file += skip as u8;
                } else if let Some((piece, color)) = Piece::from_char(c) {
                    if file < 8 {
                        cells[(rank * 8 + file) as usize] = Cell::occupied(piece, color);
                    }
                    file += 1;
                } else {
                    return Err(FenError::InvalidPiecePlacement(format!(
                        "invalid character '{}' in rank {}",
                        c,
                        rank + 1
                    )));
                }
                if file > 8 {
                    break;
                }
            }
            if file != 8 {
                return Err(FenError::InvalidPiecePlacement(format!(
                    "rank {} does not have 8 squares",
                    rank + 1
                )));
            }
        }

        Ok(cells)
    }

    /// Returns the cell on `sq`.
    pub fn cell(&self, sq: Square) -> Cell {
        self.cells[sq.index() as usize]
    }
}

impl Default for FenParser {
    fn default() -> Self {
        Self::parse(Self::STARTPOS).expect("STARTPOS is valid")
    }
}
