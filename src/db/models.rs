//! Database models for finished matches.

use chrono::{DateTime, NaiveDateTime, Utc};
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use serde::Serialize;
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::games::tictactoe::Board;
use crate::recorder::{MatchRecord, MatchResult};

/// A stored match row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::matches)]
pub struct StoredMatch {
    id: i32,
    host_name: String,
    challenger_name: String,
    board: String,
    result: String,
    created_at: NaiveDateTime,
}

impl StoredMatch {
    /// Parses the stored result text into a [`MatchResult`].
    #[instrument(skip(self), fields(result = %self.result))]
    pub fn parse_result(&self) -> Result<MatchResult, DbError> {
        self.result
            .parse()
            .map_err(|e| DbError::new(format!("Invalid stored result: {}", e)))
    }

    /// Decodes the stored board snapshot.
    #[instrument(skip(self), fields(match_id = self.id))]
    pub fn parse_board(&self) -> Result<Board, DbError> {
        Ok(serde_json::from_str(&self.board)?)
    }
}

/// Insertable match row.
#[derive(Debug, Clone, Insertable, new, Getters)]
#[diesel(table_name = schema::matches)]
pub struct NewMatch {
    host_name: String,
    challenger_name: String,
    board: String,
    result: String,
    created_at: NaiveDateTime,
}

impl NewMatch {
    /// Builds a row from a finished match record.
    #[instrument(skip(record), fields(result = %record.result()))]
    pub fn from_record(record: &MatchRecord) -> Result<Self, DbError> {
        let [host_name, challenger_name] = record.players().clone();
        Ok(Self::new(
            host_name,
            challenger_name,
            serde_json::to_string(record.board())?,
            record.result().to_string(),
            record.recorded_at().naive_utc(),
        ))
    }
}

/// A match as presented in history listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    id: i32,
    players: [String; 2],
    board: Board,
    result: MatchResult,
    created_at: DateTime<Utc>,
}

impl TryFrom<StoredMatch> for MatchSummary {
    type Error = DbError;

    fn try_from(row: StoredMatch) -> Result<Self, Self::Error> {
        let board = row.parse_board()?;
        let result = row.parse_result()?;
        Ok(Self {
            id: row.id,
            players: [row.host_name, row.challenger_name],
            board,
            result,
            created_at: row.created_at.and_utc(),
        })
    }
}
