//! Database persistence layer for finished matches.

mod error;
mod models;
mod repository;
mod schema; // Diesel generated schema - internal use only

pub use error::DbError;
pub use models::{MatchSummary, NewMatch, StoredMatch};
pub use repository::{MIGRATIONS, MatchRepository};
