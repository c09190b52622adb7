//! Command-line interface for strictly_arena.

use crate::games::tictactoe::Mark;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Arena - two-player tic-tac-toe rooms with an automated opponent
#[derive(Parser, Debug)]
#[command(name = "strictly_arena")]
#[command(about = "Realtime tic-tac-toe server with move recommendations", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game server
    Serve {
        /// Path to the TOML config file (defaults apply if it is missing)
        #[arg(short, long, default_value = "arena.toml")]
        config: PathBuf,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the database file (created if it doesn't exist)
        #[arg(long)]
        db_path: Option<String>,
    },

    /// Print the engine's move for a position
    Recommend {
        /// Board as 9 characters, row-major: X, O, or - for empty
        board: String,

        /// Engine strength: easy or hard
        #[arg(short, long, default_value = "hard")]
        difficulty: String,

        /// Mark the engine plays
        #[arg(short, long, default_value = "O")]
        mark: Mark,
    },

    /// List a player's finished matches
    History {
        /// Display name to look up
        player: String,

        /// Path to the database file
        #[arg(long, default_value = "strictly_arena.db")]
        db_path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommend_defaults() {
        let cli = Cli::try_parse_from(["strictly_arena", "recommend", "XX-OO----"]).unwrap();
        match cli.command {
            Command::Recommend {
                board,
                difficulty,
                mark,
            } => {
                assert_eq!(board, "XX-OO----");
                assert_eq!(difficulty, "hard");
                assert_eq!(mark, Mark::O);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_serve_overrides_optional() {
        let cli = Cli::try_parse_from(["strictly_arena", "serve", "--port", "4000"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Serve { port: Some(4000), host: None, .. }
        ));
    }
}
