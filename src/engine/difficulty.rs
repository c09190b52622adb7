//! Difficulty selection for the move engine.

use super::EngineError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

/// Strategy used to pick the automated opponent's move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Difficulty {
    /// Rule-ordered heuristic: win, block, centre, corner, anything.
    Easy,
    /// Exhaustive minimax search; never loses a drawable position.
    Hard,
}

impl FromStr for Difficulty {
    type Err = EngineError;

    #[instrument]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "hard" => Ok(Self::Hard),
            other => Err(EngineError::InvalidDifficulty(other.to_string())),
        }
    }
}
