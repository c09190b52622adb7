//! Exhaustive minimax search.
//!
//! Every call works on its own copy of the board, so the recursion is a pure
//! function of the position. Scores are +1 when the optimised mark wins,
//! -1 when its opponent wins and 0 for a draw.

use crate::games::tictactoe::{Board, Mark, is_full, winner};
use tracing::instrument;

/// Picks the move with the best minimax score for `mark`.
///
/// Ties go to the lowest index. Returns `None` only when the board has no
/// empty square.
#[instrument(level = "debug", skip(board), fields(%mark))]
pub fn minimax_move(board: &Board, mark: Mark) -> Option<usize> {
    let mut best: Option<(usize, i8)> = None;

    for pos in board.empty_cells() {
        let Some(next) = board.with_mark(pos, mark) else {
            continue;
        };
        let score = score(&next, mark, mark.opponent());
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((pos, score));
        }
    }

    best.map(|(pos, _)| pos)
}

/// Value of `board` for `maximiser` with `to_move` about to play.
fn score(board: &Board, maximiser: Mark, to_move: Mark) -> i8 {
    if let Some(mark) = winner(board) {
        return if mark == maximiser { 1 } else { -1 };
    }
    if is_full(board) {
        return 0;
    }

    let replies = board
        .empty_cells()
        .filter_map(|pos| board.with_mark(pos, to_move))
        .map(|next| score(&next, maximiser, to_move.opponent()));

    if to_move == maximiser {
        replies.max().unwrap_or(0)
    } else {
        replies.min().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_takes_immediate_win() {
        let board: Board = "XX-OO----".parse().unwrap();
        assert_eq!(minimax_move(&board, Mark::X), Some(2));
    }

    #[test]
    fn test_blocks_when_no_win() {
        // X threatens the top row; every other reply loses at once.
        let board: Board = "XX--O----".parse().unwrap();
        assert_eq!(minimax_move(&board, Mark::O), Some(2));
    }

    #[test]
    fn test_empty_board_scores_as_draw() {
        assert_eq!(score(&Board::new(), Mark::X, Mark::X), 0);
    }

    #[test]
    fn test_lowest_index_wins_ties() {
        // X X O / O O X / X - -: both replies draw, the first open square is chosen.
        let board: Board = "XXOOOXX--".parse().unwrap();
        assert_eq!(minimax_move(&board, Mark::O), Some(7));
    }

    #[test]
    fn test_full_board_has_no_move() {
        let board: Board = "XOXOXXOXO".parse().unwrap();
        assert_eq!(minimax_move(&board, Mark::O), None);
    }
}
