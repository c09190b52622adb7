//! Strictly Arena library - realtime two-player tic-tac-toe
//!
//! Players meet in named rooms over a websocket. The first to join a room
//! hosts as X, the second challenges as O, and every move is validated by
//! the room before it is broadcast. Finished matches are stored in SQLite.
//! A stateless engine recommends moves for an automated opponent.
//!
//! # Architecture
//!
//! - **Games**: board, marks, win and draw rules
//! - **Engine**: heuristic (`easy`) and minimax (`hard`) move choice
//! - **Session**: one match as a pure state machine
//! - **Registry**: one task per room, addressed by room id
//! - **Gateway**: websocket frames in, per-connection outboxes out
//! - **Recorder / Db**: persistence of finished matches
//!
//! # Example
//!
//! ```
//! use strictly_arena::{Board, Mark, recommend};
//!
//! let board: Board = "XX-OO----".parse().unwrap();
//! assert_eq!(recommend(&board, Mark::X, "hard").unwrap(), 2);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod engine;
mod games;
mod gateway;
mod outbox;
mod protocol;
mod recorder;
mod registry;
mod server;
mod session;

pub mod cli;
pub mod db;

// Crate-level exports - Configuration
pub use config::{ArenaConfig, ConfigError};

// Crate-level exports - Engine
pub use engine::{Difficulty, EngineError, heuristic_move, minimax_move, recommend};

// Crate-level exports - Game types (tic-tac-toe)
pub use games::tictactoe::{
    BOARD_SIZE, Board, BoardParseError, CENTER, CORNERS, Mark, PlaceError, Square, WIN_LINES,
    is_draw, is_full, winner,
};

// Crate-level exports - Realtime plumbing
pub use gateway::Gateway;
pub use outbox::Outboxes;
pub use protocol::{ClientEvent, ServerEvent};
pub use registry::{DisconnectOutcome, SessionRegistry};

// Crate-level exports - Session management
pub use session::{
    Admission, ConnectionId, Departure, IgnoreReason, JoinError, MoveOutcome, Role, RoomId, Seat,
    Session, SessionStatus,
};

// Crate-level exports - Persistence
pub use recorder::{MatchRecord, MatchResult, RecordError, ResultRecorder, SqliteRecorder};

// Crate-level exports - HTTP
pub use server::{
    AiMoveRequest, AiMoveResponse, ApiError, AppState, HistoryQuery, SaveResultRequest, router,
};
