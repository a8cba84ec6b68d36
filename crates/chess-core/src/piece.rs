//! Chess piece and board cell representation.

use crate::Color;

/// The six types of chess pieces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Piece {
    Pawn = 0,
    Knight = 1,
    Bishop = 2,
    Rook = 3,
    Queen = 4,
    King = 5,
}

impl Piece {
    /// All piece types in order.
    pub const ALL: [Piece; 6] = [
        Piece::Pawn,
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ];

    /// Returns the index of this piece type (0-5).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the letter for this piece with the given color.
    ///
    /// White pieces are upper case, black pieces lower case, as in FEN.
    pub const fn to_char(self, color: Color) -> char {
        let c = match self {
            Piece::Pawn => 'p',
            Piece::Knight => 'n',
            Piece::Bishop => 'b',
            Piece::Rook => 'r',
            Piece::Queen => 'q',
            Piece::King => 'k',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parses a piece letter into a piece and color.
    pub const fn from_char(c: char) -> Option<(Piece, Color)> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        let piece = match c.to_ascii_lowercase() {
            'p' => Piece::Pawn,
            'n' => Piece::Knight,
            'b' => Piece::Bishop,
            'r' => Piece::Rook,
            'q' => Piece::Queen,
            'k' => Piece::King,
            _ => return None,
        };
        Some((piece, color))
    }

    /// Returns true if this piece is a sliding piece (bishop, rook, or queen).
    #[inline]
    pub const fn is_slider(self) -> bool {
        matches!(self, Piece::Bishop | Piece::Rook | Piece::Queen)
    }
}

impl std::fmt::Display for Piece {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Piece::Pawn => "Pawn",
            Piece::Knight => "Knight",
            Piece::Bishop => "Bishop",
            Piece::Rook => "Rook",
            Piece::Queen => "Queen",
            Piece::King => "King",
        };
        write!(f, "{}", name)
    }
}

/// The contents of one board square.
///
/// A cell is either empty or holds exactly one piece of exactly one color,
/// so an empty cell never carries a color and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Cell(Option<(Piece, Color)>);

impl Cell {
    pub const EMPTY: Cell = Cell(None);

    /// A cell holding `piece` of `color`.
    #[inline]
    pub const fn occupied(piece: Piece, color: Color) -> Self {
        Cell(Some((piece, color)))
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0.is_none()
    }

    #[inline]
    pub const fn piece(self) -> Option<Piece> {
        match self.0 {
            Some((piece, _)) => Some(piece),
            None => None,
        }
    }

    #[inline]
    pub const fn color(self) -> Option<Color> {
        match self.0 {
            Some((_, color)) => Some(color),
            None => None,
        }
    }

    /// Returns both halves of an occupied cell.
    #[inline]
    pub const fn contents(self) -> Option<(Piece, Color)> {
        self.0
    }

    /// True if the cell holds a piece of `color`.
    #[inline]
    pub fn is_color(self, color: Color) -> bool {
        self.color() == Some(color)
    }

    /// Letter for the cell, `' '` when empty.
    pub const fn to_char(self) -> char {
        match self.0 {
            Some((piece, color)) => piece.to_char(color),
            None => ' ',
        }
    }
}

impl From<(Piece, Color)> for Cell {
    fn from((piece, color): (Piece, Color)) -> Self {
        Cell::occupied(piece, color)
    }
}
