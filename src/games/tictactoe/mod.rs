//! Tic-tac-toe board, marks and rules.

mod rules;
mod types;

pub use rules::{WIN_LINES, is_draw, is_full, winner};
pub use types::{
    BOARD_SIZE, Board, BoardParseError, CENTER, CORNERS, Mark, PlaceError, Square,
};
