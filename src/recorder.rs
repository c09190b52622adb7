//! Durable storage of finished matches.
//!
//! Rooms hand a [`MatchRecord`] to a [`ResultRecorder`] when a match ends and
//! never wait on the outcome: a storage failure is logged and the room is torn
//! down regardless.

use crate::db::{MatchRepository, NewMatch};
use crate::games::tictactoe::{Board, Mark};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info, instrument};

/// Final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum MatchResult {
    /// X completed a line.
    #[serde(rename = "X wins")]
    #[display("X wins")]
    XWins,
    /// O completed a line.
    #[serde(rename = "O wins")]
    #[display("O wins")]
    OWins,
    /// Board filled with no line.
    #[serde(rename = "draw")]
    #[display("draw")]
    Draw,
}

impl MatchResult {
    /// Result for a finished board with the given winner (`None` = draw).
    pub fn from_winner(winner: Option<Mark>) -> Self {
        match winner {
            Some(Mark::X) => Self::XWins,
            Some(Mark::O) => Self::OWins,
            None => Self::Draw,
        }
    }
}

impl FromStr for MatchResult {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "X wins" => Ok(Self::XWins),
            "O wins" => Ok(Self::OWins),
            "draw" => Ok(Self::Draw),
            other => Err(RecordError::new(format!("Invalid match result: '{}'", other))),
        }
    }
}

/// Everything persisted about a finished match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, new)]
pub struct MatchRecord {
    /// Display names, host first.
    players: [String; 2],
    /// Final board.
    board: Board,
    /// How the match ended.
    result: MatchResult,
    /// When the match finished.
    recorded_at: DateTime<Utc>,
}

/// Failure to store a match record.
#[derive(Debug, Clone, Display, Error)]
#[display("Record error: {} at {}:{}", message, file, line)]
pub struct RecordError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl RecordError {
    /// Creates a new record error with caller location tracking.
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<crate::db::DbError> for RecordError {
    #[track_caller]
    fn from(err: crate::db::DbError) -> Self {
        Self::new(err.to_string())
    }
}

/// Sink for finished matches.
#[async_trait]
pub trait ResultRecorder: Send + Sync {
    /// Stores one finished match.
    async fn record(&self, record: MatchRecord) -> Result<(), RecordError>;
}

/// Recorder backed by the SQLite match repository.
#[derive(Debug, Clone)]
pub struct SqliteRecorder {
    repository: MatchRepository,
}

impl SqliteRecorder {
    /// Creates a recorder writing through `repository`.
    #[instrument(skip(repository))]
    pub fn new(repository: MatchRepository) -> Self {
        info!("Creating SQLite result recorder");
        Self { repository }
    }
}

#[async_trait]
impl ResultRecorder for SqliteRecorder {
    #[instrument(skip(self, record), fields(result = %record.result, players = ?record.players))]
    async fn record(&self, record: MatchRecord) -> Result<(), RecordError> {
        let repository = self.repository.clone();
        let row = NewMatch::from_record(&record)?;

        debug!("Handing match record to blocking pool");
        let stored = tokio::task::spawn_blocking(move || repository.record_match(row))
            .await
            .map_err(|e| RecordError::new(format!("Recorder task failed: {}", e)))??;

        info!(match_id = stored.id(), "Match result saved");
        Ok(())
    }
}
