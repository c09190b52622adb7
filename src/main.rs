//! Strictly Arena - Unified CLI
//!
//! Realtime tic-tac-toe server, move recommender and history viewer.

#![warn(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use strictly_arena::cli::{Cli, Command};
use strictly_arena::db::MatchRepository;
use strictly_arena::{
    AppState, ArenaConfig, Board, Gateway, Mark, Outboxes, SessionRegistry, SqliteRecorder,
    recommend, router,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_arena=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            db_path,
        } => {
            let config = ArenaConfig::load_or_default(&config)?.with_overrides(host, port, db_path);
            run_server(config).await
        }
        Command::Recommend {
            board,
            difficulty,
            mark,
        } => run_recommend(&board, &difficulty, mark),
        Command::History { player, db_path } => run_history(&player, db_path),
    }
}

/// Run the realtime game server
#[instrument(skip(config), fields(addr = %config.bind_addr()))]
async fn run_server(config: ArenaConfig) -> Result<()> {
    info!("Starting Strictly Arena server");

    let repository = MatchRepository::new(config.db_path().clone())?;
    repository.run_migrations()?;

    let outboxes = Outboxes::new();
    let recorder = Arc::new(SqliteRecorder::new(repository.clone()));
    let registry = SessionRegistry::new(outboxes.clone(), recorder, config.idle_ttl());
    let gateway = Gateway::new(registry, outboxes);
    let app = router(AppState::new(gateway, repository));

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    info!("Listening on http://{}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
        })
        .await?;

    Ok(())
}

/// Print the engine's recommendation for a compact board string
fn run_recommend(board: &str, difficulty: &str, mark: Mark) -> Result<()> {
    let board: Board = board.parse()?;
    let cell = recommend(&board, mark, difficulty)?;
    println!("{}", board.display());
    println!("{} plays {}", mark, cell);
    Ok(())
}

/// Print a player's stored matches, newest first
fn run_history(player: &str, db_path: String) -> Result<()> {
    let repository = MatchRepository::new(db_path)?;
    repository.run_migrations()?;

    let matches = repository.history_for(player)?;
    if matches.is_empty() {
        println!("No matches recorded for {}", player);
        return Ok(());
    }
    for summary in matches {
        let [host, challenger] = summary.players();
        println!(
            "#{} {} vs {}: {} ({})",
            summary.id(),
            host,
            challenger,
            summary.result(),
            summary.created_at().format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}
