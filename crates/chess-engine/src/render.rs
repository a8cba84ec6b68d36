//! Text board rendering.
//!
//! A board is drawn by taking a fixed-size text template for the viewing
//! side and writing each piece letter at the byte offset of its square.
//!
//! ```text
//!     a   b   c   d   e   f   g   h
//!   +---+---+---+---+---+---+---+---+
//! 8 | r | n | b | q | k | b | n | r | 8
//!   +---+---+---+---+---+---+---+---+
//! ...
//! ```

use crate::Position;
use chess_core::{Color, File, Rank, Square};

const LABEL_LEN: usize = 34;
const BORDER_LEN: usize = 36;
const ROW_LEN: usize = 38;

/// Length in bytes of every rendered board.
pub const BOARD_TEXT_LEN: usize = 2 * LABEL_LEN + BORDER_LEN + 8 * (ROW_LEN + BORDER_LEN);

/// Renders `position` as seen from `view`'s side of the board.
///
/// White sees rank 8 at the top and the a-file on the left; black sees the
/// board turned around. White pieces are upper case.
pub fn render_board(position: &Position, view: Color) -> String {
    let mut text = template(view).into_bytes();

    for row in 0..8 {
        for col in 0..8 {
            let sq = square_at(view, row, col);
            text[cell_offset(row, col)] = position.cell(sq).to_char() as u8;
        }
    }

    text.into_iter().map(char::from).collect()
}

/// Byte offset of the piece letter drawn in the given template row and
/// column, both counted from the top left.
const fn cell_offset(row: usize, col: usize) -> usize {
    LABEL_LEN + BORDER_LEN + row * (ROW_LEN + BORDER_LEN) + 4 + col * 4
}

fn square_at(view: Color, row: usize, col: usize) -> Square {
    let (rank, file) = match view {
        Color::White => (7 - row, col),
        Color::Black => (row, 7 - col),
    };
    Square::new(File::ALL[file], Rank::ALL[rank])
}

/// The empty board for one side, labels included.
fn template(view: Color) -> String {
    let mut files = File::ALL;
    let mut ranks = Rank::ALL;
    match view {
        Color::White => ranks.reverse(),
        Color::Black => files.reverse(),
    }

    let mut label = String::from("  ");
    for file in files {
        label.push_str("  ");
        label.push(file.to_char());
        label.push(' ');
    }
    label.truncate(label.trim_end().len());
    label.push('\n');

    let border = format!("  +{}\n", "---+".repeat(8));

    let mut text = String::with_capacity(BOARD_TEXT_LEN);
    text.push_str(&label);
    text.push_str(&border);
    for rank in ranks {
        let number = rank.number();
        text.push_str(&format!("{} |", number));
        text.push_str(&"   |".repeat(8));
        text.push_str(&format!(" {}\n", number));
        text.push_str(&border);
    }
    text.push_str(&label);
    text
}
