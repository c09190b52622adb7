//! Rule-ordered move selection.

use crate::games::tictactoe::{Board, CENTER, CORNERS, Mark, winner};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::instrument;

/// Picks a move by the first matching rule:
/// win, block, centre, random free corner, random free square.
///
/// Returns `None` only when the board has no empty square.
#[instrument(level = "debug", skip(board, rng), fields(%mark))]
pub fn heuristic_move<R: Rng + ?Sized>(
    board: &Board,
    mark: Mark,
    rng: &mut R,
) -> Option<usize> {
    if let Some(pos) = first_completing(board, mark) {
        return Some(pos);
    }

    if let Some(pos) = first_completing(board, mark.opponent()) {
        return Some(pos);
    }

    if board.is_empty(CENTER) {
        return Some(CENTER);
    }

    let corners: Vec<usize> = CORNERS
        .iter()
        .copied()
        .filter(|&pos| board.is_empty(pos))
        .collect();
    if let Some(&pos) = corners.choose(rng) {
        return Some(pos);
    }

    let open: Vec<usize> = board.empty_cells().collect();
    open.choose(rng).copied()
}

/// First empty square (left to right) that would give `mark` a line.
fn first_completing(board: &Board, mark: Mark) -> Option<usize> {
    board.empty_cells().find(|&pos| {
        board
            .with_mark(pos, mark)
            .is_some_and(|next| winner(&next) == Some(mark))
    })
}
