//! Win detection logic for tic-tac-toe.

use super::super::{Board, Mark, Square};
use tracing::instrument;

/// The eight winning lines: rows, columns, diagonals.
pub const WIN_LINES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// Checks if there is a winner on the board.
///
/// Returns `Some(mark)` if a line holds three of the same mark,
/// `None` otherwise.
#[instrument(level = "trace", skip(board))]
pub fn winner(board: &Board) -> Option<Mark> {
    let squares = board.squares();
    WIN_LINES.iter().find_map(|&[a, b, c]| match squares[a] {
        Square::Occupied(mark) if squares[b] == squares[a] && squares[c] == squares[a] => {
            Some(mark)
        }
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_winner_empty_board() {
        assert_eq!(winner(&Board::new()), None);
    }

    #[test]
    fn test_winner_top_row() {
        let board: Board = "XXX-O-O--".parse().unwrap();
        assert_eq!(winner(&board), Some(Mark::X));
    }

    #[test]
    fn test_winner_anti_diagonal() {
        let board: Board = "XXO-O-O-X".parse().unwrap();
        assert_eq!(winner(&board), Some(Mark::O));
    }

    #[test]
    fn test_no_winner_incomplete() {
        let board: Board = "XX-------".parse().unwrap();
        assert_eq!(winner(&board), None);
    }

    #[test]
    fn test_mixed_line_is_not_a_win() {
        let board: Board = "XOX------".parse().unwrap();
        assert_eq!(winner(&board), None);
    }

    #[test]
    fn test_every_line_is_detected_for_both_marks() {
        for mark in [Mark::X, Mark::O] {
            for line in WIN_LINES {
                let mut board = Board::new();
                for pos in line {
                    board.place(pos, mark).unwrap();
                }
                assert_eq!(winner(&board), Some(mark), "line {:?}", line);
            }
        }
    }
}
