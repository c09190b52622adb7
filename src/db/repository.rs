//! Database repository for finished matches.

use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument};

use crate::db::{DbError, MatchSummary, NewMatch, StoredMatch, schema};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Database repository for match history.
#[derive(Debug, Clone)]
pub struct MatchRepository {
    db_path: String,
}

impl MatchRepository {
    /// Creates a new repository for the database at the given path.
    ///
    /// Every operation opens its own connection, so `":memory:"` does not
    /// keep data between calls; use a file (or a temp file in tests).
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the path is empty.
    #[instrument(skip(db_path), fields(db_path = %db_path))]
    pub fn new(db_path: String) -> Result<Self, DbError> {
        if db_path.trim().is_empty() {
            return Err(DbError::new("Database path must not be empty"));
        }
        info!(path = %db_path, "Creating MatchRepository");
        Ok(Self { db_path })
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        SqliteConnection::establish(&self.db_path)
            .map_err(|e| DbError::new(format!("Failed to connect to '{}': {}", self.db_path, e)))
    }

    /// Applies any pending schema migrations.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<(), DbError> {
        let mut conn = self.connection()?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(())
    }

    /// Stores a finished match.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self, row), fields(host = %row.host_name(), challenger = %row.challenger_name(), result = %row.result()))]
    pub fn record_match(&self, row: NewMatch) -> Result<StoredMatch, DbError> {
        debug!("Recording match result");
        let mut conn = self.connection()?;

        let stored = diesel::insert_into(schema::matches::table)
            .values(&row)
            .returning(StoredMatch::as_returning())
            .get_result(&mut conn)?;

        info!(match_id = stored.id(), result = %stored.result(), "Match recorded");
        Ok(stored)
    }

    /// Lists matches the player took part in, most recent first.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs or a stored row is corrupt.
    #[instrument(skip(self))]
    pub fn history_for(&self, player: &str) -> Result<Vec<MatchSummary>, DbError> {
        debug!(player = %player, "Loading match history");
        let mut conn = self.connection()?;

        let rows = schema::matches::table
            .filter(
                schema::matches::host_name
                    .eq(player)
                    .or(schema::matches::challenger_name.eq(player)),
            )
            .order((schema::matches::created_at.desc(), schema::matches::id.desc()))
            .select(StoredMatch::as_select())
            .load::<StoredMatch>(&mut conn)?;

        info!(player = %player, count = rows.len(), "Match history loaded");
        rows.into_iter().map(MatchSummary::try_from).collect()
    }

    /// Deletes a match by id. Returns `false` if no such match exists.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a database error occurs.
    #[instrument(skip(self))]
    pub fn delete_match(&self, match_id: i32) -> Result<bool, DbError> {
        let mut conn = self.connection()?;

        let deleted = diesel::delete(schema::matches::table.find(match_id)).execute(&mut conn)?;

        if deleted == 0 {
            debug!(match_id, "No match to delete");
        } else {
            info!(match_id, "Match deleted");
        }
        Ok(deleted > 0)
    }
}
