//! HTTP surface: the realtime socket, the move recommender and match history.

use crate::db::{DbError, MatchRepository, MatchSummary, NewMatch};
use crate::engine::{self, EngineError};
use crate::games::tictactoe::{Board, Mark};
use crate::gateway::Gateway;
use crate::recorder::{MatchRecord, MatchResult};
use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State, WebSocketUpgrade},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::str::FromStr;
use tower::ServiceBuilder;
use tracing::{debug, error, info, instrument, warn};

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    gateway: Gateway,
    repository: MatchRepository,
}

impl AppState {
    /// Bundles the gateway and the match repository.
    pub fn new(gateway: Gateway, repository: MatchRepository) -> Self {
        Self {
            gateway,
            repository,
        }
    }
}

/// Body of `POST /game/ai-move`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiMoveRequest {
    /// Current position.
    pub board: Board,
    /// `easy` or `hard`.
    pub difficulty: String,
    /// Mark the engine plays.
    #[serde(default = "default_engine_mark")]
    pub symbol: Mark,
}

fn default_engine_mark() -> Mark {
    Mark::O
}

/// Reply of `POST /game/ai-move`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiMoveResponse {
    /// Recommended cell.
    #[serde(rename = "move")]
    pub cell: usize,
}

/// Body of `POST /game/result`.
///
/// Fields are optional so a missing one is answered with a 400 [`ApiError`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveResultRequest {
    /// Final position.
    pub board: Option<Board>,
    /// `X wins`, `O wins` or `draw`.
    pub result: Option<String>,
    /// Host then challenger display names.
    pub players: Option<Vec<String>>,
}

impl SaveResultRequest {
    /// Validates the body into a record stamped now.
    pub fn into_record(self) -> Result<MatchRecord, ApiError> {
        let (Some(board), Some(result), Some(players)) = (self.board, self.result, self.players)
        else {
            return Err(ApiError::InvalidRequest(
                "Board, result, and players are required".to_string(),
            ));
        };
        let players: [String; 2] = players
            .try_into()
            .map_err(|_| ApiError::InvalidRequest("Exactly two players are required".to_string()))?;
        let result =
            MatchResult::from_str(&result).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(MatchRecord::new(players, board, result, chrono::Utc::now()))
    }
}

/// Query of `GET /game/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    /// Display name to look up.
    pub player: String,
}

/// Errors returned by the HTTP handlers.
#[derive(Debug, Display, Error)]
pub enum ApiError {
    /// Bad recommender input.
    #[display("{}", _0)]
    Engine(EngineError),
    /// Missing or unreadable request fields.
    #[display("{}", _0)]
    InvalidRequest(#[error(not(source))] String),
    /// Storage failure.
    #[display("{}", _0)]
    Db(DbError),
    /// A blocking task panicked or was cancelled.
    #[display("Background task failed: {}", _0)]
    Task(#[error(not(source))] String),
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        ApiError::Engine(err)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        ApiError::Db(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ApiError::Engine(EngineError::InvalidDifficulty(_)) => {
                (StatusCode::BAD_REQUEST, "InvalidDifficulty")
            }
            ApiError::Engine(EngineError::NoMovesAvailable) => {
                (StatusCode::BAD_REQUEST, "NoMovesAvailable")
            }
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "InvalidRequest"),
            ApiError::Db(_) | ApiError::Task(_) => {
                error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "InternalError")
            }
        };
        let body = Json(json!({ "error": kind, "message": self.to_string() }));
        (status, body).into_response()
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/game/ai-move", post(ai_move))
        .route("/game/result", post(save_result))
        .route("/game/history", get(history))
        .route("/game/{id}", delete(delete_match))
        .route("/health", get(health))
        .with_state(state)
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
}

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let gateway = state.gateway.clone();
    ws.on_upgrade(move |socket| gateway.serve_socket(socket))
}

#[instrument(skip(request), fields(difficulty = %request.difficulty, symbol = %request.symbol))]
async fn ai_move(Json(request): Json<AiMoveRequest>) -> Result<Json<AiMoveResponse>, ApiError> {
    let AiMoveRequest {
        board,
        difficulty,
        symbol,
    } = request;
    // Exhaustive search must stay off the runtime threads that drive rooms.
    let cell = tokio::task::spawn_blocking(move || engine::recommend(&board, symbol, &difficulty))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .inspect_err(|e| warn!(error = %e, "Recommendation refused"))?;
    debug!(cell, "Recommendation ready");
    Ok(Json(AiMoveResponse { cell }))
}

#[instrument(skip(state, request))]
async fn save_result(
    State(state): State<AppState>,
    Json(request): Json<SaveResultRequest>,
) -> Result<(StatusCode, Json<MatchSummary>), ApiError> {
    let record = request
        .into_record()
        .inspect_err(|e| warn!(error = %e, "Result rejected"))?;
    let row = NewMatch::from_record(&record)?;
    let repository = state.repository.clone();
    let stored = tokio::task::spawn_blocking(move || repository.record_match(row))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))??;
    let summary = MatchSummary::try_from(stored)?;
    info!(id = *summary.id(), "Match result saved");
    Ok((StatusCode::CREATED, Json(summary)))
}

#[instrument(skip(state))]
async fn history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MatchSummary>>, ApiError> {
    let repository = state.repository.clone();
    let matches = tokio::task::spawn_blocking(move || repository.history_for(&query.player))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))??;
    Ok(Json(matches))
}

#[instrument(skip(state))]
async fn delete_match(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let repository = state.repository.clone();
    let deleted = tokio::task::spawn_blocking(move || repository.delete_match(id))
        .await
        .map_err(|e| ApiError::Task(e.to_string()))??;
    Ok(if deleted {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    })
}

async fn health() -> &'static str {
    "ok"
}
