//! Game rules for tic-tac-toe.
//!
//! Pure functions over a [`Board`](super::Board); no state.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{WIN_LINES, winner};
