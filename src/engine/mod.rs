//! Move recommendation for the automated opponent.
//!
//! Two strategies sit behind [`Difficulty`]: a fast rule-ordered heuristic
//! (`easy`) and an exhaustive minimax search (`hard`).

mod difficulty;
mod heuristic;
mod minimax;

pub use difficulty::Difficulty;
pub use heuristic::heuristic_move;
pub use minimax::minimax_move;

use crate::games::tictactoe::{Board, Mark};
use derive_more::{Display, Error};
use rand::Rng;
use tracing::{debug, instrument, warn};

/// Errors reported by the move engine.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum EngineError {
    /// The difficulty string is not one of `easy` or `hard`.
    #[display("Invalid difficulty '{}': expected 'easy' or 'hard'", _0)]
    InvalidDifficulty(#[error(not(source))] String),
    /// The board has no empty square to play.
    #[display("No moves available: the board is full")]
    NoMovesAvailable,
}

impl Difficulty {
    /// Chooses a move for `mark` using this strategy.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoMovesAvailable`] if the board is full.
    #[instrument(skip(self, board, rng), fields(difficulty = %self))]
    pub fn choose_move<R: Rng + ?Sized>(
        self,
        board: &Board,
        mark: Mark,
        rng: &mut R,
    ) -> Result<usize, EngineError> {
        let choice = match self {
            Difficulty::Easy => heuristic_move(board, mark, rng),
            Difficulty::Hard => minimax_move(board, mark),
        };

        match choice {
            Some(pos) => {
                debug!(position = pos, "Engine chose move");
                Ok(pos)
            }
            None => {
                warn!("Engine asked to move on a full board");
                Err(EngineError::NoMovesAvailable)
            }
        }
    }
}

/// Recommends a cell index for `mark` on `board`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidDifficulty`] for any difficulty other than
/// `easy` or `hard`, and [`EngineError::NoMovesAvailable`] on a full board.
#[instrument(skip(board), fields(board = ?board.squares()))]
pub fn recommend(board: &Board, mark: Mark, difficulty: &str) -> Result<usize, EngineError> {
    let difficulty: Difficulty = difficulty.parse()?;
    difficulty.choose_move(board, mark, &mut rand::rng())
}
