//! Chess position representation.

use chess_core::{Cell, Color, FenError, FenParser, Move, Piece, Square};

/// A board of 64 cells plus the side to move.
///
/// `Clone` is a full copy of the board; the move generator relies on it to
/// try a move on a scratch position without touching the original.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Board contents indexed by square (a1 = 0, h8 = 63).
    cells: [Cell; 64],

    /// The side to move.
    pub side_to_move: Color,
}

impl Position {
    /// Creates a position with no pieces on it.
    pub fn empty(side_to_move: Color) -> Self {
        Position {
            cells: [Cell::EMPTY; 64],
            side_to_move,
        }
    }

    /// Creates the standard starting position, white to move.
    pub fn startpos() -> Self {
        const BACK_RANK: [Piece; 8] = [
            Piece::Rook,
            Piece::Knight,
            Piece::Bishop,
            Piece::Queen,
            Piece::King,
            Piece::Bishop,
            Piece::Knight,
            Piece::Rook,
        ];

        let mut position = Position::empty(Color::White);
        for (file, piece) in BACK_RANK.into_iter().enumerate() {
            position.cells[file] = Cell::occupied(piece, Color::White);
            position.cells[8 + file] = Cell::occupied(Piece::Pawn, Color::White);
            position.cells[48 + file] = Cell::occupied(Piece::Pawn, Color::Black);
            position.cells[56 + file] = Cell::occupied(piece, Color::Black);
        }
        position
    }

    /// Creates a position from a FEN string.
    ///
    /// Only piece placement and the active color are read.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let parsed = FenParser::parse(fen)?;
        Ok(Position {
            cells: parsed.cells,
            side_to_move: parsed.side_to_move,
        })
    }

    /// Converts the placement and active color to FEN.
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8u8).rev() {
            let mut empty_count = 0;
            for file in 0..8u8 {
                match self.cells[(rank * 8 + file) as usize].contents() {
                    Some((piece, color)) => {
                        if empty_count > 0 {
                            fen.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        fen.push(piece.to_char(color));
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Color::White => 'w',
            Color::Black => 'b',
        });
        fen
    }

    /// Returns the cell on the given square.
    #[inline]
    pub fn cell(&self, sq: Square) -> Cell {
        self.cells[sq.index() as usize]
    }

    /// Returns the piece and color at the given square, if any.
    #[inline]
    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        self.cell(sq).contents()
    }

    /// Replaces the contents of a square.
    #[inline]
    pub fn set(&mut self, sq: Square, cell: impl Into<Cell>) {
        self.cells[sq.index() as usize] = cell.into();
    }

    /// Empties a square.
    #[inline]
    pub fn clear(&mut self, sq: Square) {
        self.cells[sq.index() as usize] = Cell::EMPTY;
    }

    /// All 64 cells, a1 first.
    #[inline]
    pub fn cells(&self) -> &[Cell; 64] {
        &self.cells
    }

    /// Applies a move in place and passes the turn.
    ///
    /// The destination takes whatever stood on the source square and the
    /// source becomes empty. No legality check is made here.
    pub fn apply_move(&mut self, m: Move) {
        let moving = self.cell(m.from());
        self.set(m.to(), moving);
        self.clear(m.from());
        self.side_to_move = self.side_to_move.opposite();
    }

    /// Returns a copy of this position with `m` applied.
    pub fn with_move(&self, m: Move) -> Position {
        let mut next = self.clone();
        next.apply_move(m);
        next
    }

    /// Finds the square holding the king of `color`, if there is one.
    pub fn find_king(&self, color: Color) -> Option<Square> {
        let king = Cell::occupied(Piece::King, color);
        Square::all().find(|&sq| self.cell(sq) == king)
    }

    /// Returns the square holding the king of `color`.
    ///
    /// # Panics
    ///
    /// Panics if that king is not on the board. Every position reachable
    /// through legal play has both kings, so a missing one means the board
    /// has been corrupted.
    pub fn king_square(&self, color: Color) -> Square {
        match self.find_king(color) {
            Some(sq) => sq,
            None => panic!("no {} king on the board: {}", color, self.to_fen()),
        }
    }

    /// Counts the pieces of the given type and color.
    pub fn piece_count(&self, piece: Piece, color: Color) -> usize {
        let wanted = Cell::occupied(piece, color);
        self.cells.iter().filter(|&&c| c == wanted).count()
    }

    /// Counts all pieces on the board.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| !c.is_empty()).count()
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::startpos()
    }
}
