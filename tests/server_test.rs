//! Tests for the HTTP routes.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::MemoryRecorder;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tower::ServiceExt;

use strictly_arena::db::{MatchRepository, NewMatch};
use strictly_arena::{
    AppState, Board, Gateway, Mark, MatchRecord, MatchResult, Outboxes, SessionRegistry, router,
};

fn app() -> (NamedTempFile, MatchRepository, axum::Router) {
    let (db_file, repository, _gateway, router) = app_with_gateway();
    (db_file, repository, router)
}

fn app_with_gateway() -> (NamedTempFile, MatchRepository, Gateway, axum::Router) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();
    let repository = MatchRepository::new(db_path).expect("Failed to create repository");
    repository.run_migrations().expect("Migrations failed");

    let outboxes = Outboxes::new();
    let registry = SessionRegistry::new(
        outboxes.clone(),
        Arc::new(MemoryRecorder::default()),
        None,
    );
    let gateway = Gateway::new(registry, outboxes);
    let router = router(AppState::new(gateway.clone(), repository.clone()));
    (db_file, repository, gateway, router)
}

async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Body read failed")
        .to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn save_result(body: Value) -> Request<Body> {
    Request::post("/game/result")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn ai_move(body: Value) -> Request<Body> {
    Request::post("/game/ai-move")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_ai_move_hard_takes_win() {
    let (_db, _repo, router) = app();
    let (status, body) = send(
        router,
        ai_move(json!({
            "board": ["O", "O", null, "X", "X", null, "X", null, null],
            "difficulty": "hard"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "move": 2 }));
}

#[tokio::test]
async fn test_ai_move_respects_symbol() {
    let (_db, _repo, router) = app();
    let (status, body) = send(
        router,
        ai_move(json!({
            "board": ["X", "X", null, "O", "O", null, null, null, null],
            "difficulty": "easy",
            "symbol": "O"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["move"], 5);
}

#[tokio::test]
async fn test_ai_move_invalid_difficulty() {
    let (_db, _repo, router) = app();
    let (status, body) = send(
        router,
        ai_move(json!({
            "board": [null, null, null, null, null, null, null, null, null],
            "difficulty": "impossible"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidDifficulty");
}

#[tokio::test]
async fn test_ai_move_full_board() {
    let (_db, _repo, router) = app();
    let (status, body) = send(
        router,
        ai_move(json!({
            "board": ["X", "O", "X", "X", "O", "O", "O", "X", "X"],
            "difficulty": "hard"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "NoMovesAvailable");
}

#[tokio::test]
async fn test_ai_move_malformed_board() {
    let (_db, _repo, router) = app();
    let (status, _) = send(
        router,
        ai_move(json!({ "board": ["X", "Q"], "difficulty": "hard" })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_rooms_progress_during_hard_recommendation() {
    let (_db, _repo, gateway, router) = app_with_gateway();
    let request = tokio::spawn(send(
        router,
        ai_move(json!({
            "board": [null, null, null, null, null, null, null, null, null],
            "difficulty": "hard",
            "symbol": "X"
        })),
    ));
    // Let the request reach the search before joining.
    tokio::time::sleep(Duration::from_millis(1)).await;

    let (host, _host_rx) = gateway.connect();
    let admission = tokio::time::timeout(
        Duration::from_millis(100),
        gateway
            .registry()
            .join_or_create("r1".to_string(), host, "alice".to_string()),
    )
    .await
    .expect("Join stalled behind the search")
    .expect("Join failed");
    assert_eq!(admission.mark, Mark::X);
    assert!(!request.is_finished());

    let (status, body) = request.await.unwrap();
    assert_eq!(status, StatusCode::OK);
    assert!(body["move"].as_u64().is_some_and(|cell| cell < 9));
}

#[tokio::test]
async fn test_save_result_returns_created_summary() {
    let (_db, repo, router) = app();
    let (status, body) = send(
        router,
        save_result(json!({
            "board": ["X", "X", "X", "O", "O", null, null, null, null],
            "result": "X wins",
            "players": ["alice", "bob"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["players"], json!(["alice", "bob"]));
    assert_eq!(body["result"], "X wins");
    assert_eq!(body["board"][2], "X");
    assert!(body["createdAt"].is_string());

    let history = repo.history_for("bob").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(body["id"], *history[0].id());
}

#[tokio::test]
async fn test_save_result_missing_field() {
    let (_db, repo, router) = app();
    let (status, body) = send(
        router,
        save_result(json!({
            "board": ["X", "X", "X", "O", "O", null, null, null, null],
            "players": ["alice", "bob"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");
    assert_eq!(body["message"], "Board, result, and players are required");
    assert!(repo.history_for("alice").unwrap().is_empty());
}

#[tokio::test]
async fn test_save_result_rejects_unknown_result_and_player_count() {
    let (_db, repo, router) = app();
    let (status, body) = send(
        router.clone(),
        save_result(json!({
            "board": ["X", "X", "X", "O", "O", null, null, null, null],
            "result": "X resigned",
            "players": ["alice", "bob"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");

    let (status, body) = send(
        router,
        save_result(json!({
            "board": ["X", "X", "X", "O", "O", null, null, null, null],
            "result": "X wins",
            "players": ["alice"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidRequest");
    assert!(repo.history_for("alice").unwrap().is_empty());
}

#[tokio::test]
async fn test_history_and_delete() {
    let (_db, repo, router) = app();
    let board: Board = "XXXOO----".parse().unwrap();
    let record = MatchRecord::new(
        ["alice".to_string(), "bob".to_string()],
        board,
        MatchResult::XWins,
        chrono::Utc::now(),
    );
    let id = *repo
        .record_match(NewMatch::from_record(&record).unwrap())
        .unwrap()
        .id();

    let (status, body) = send(
        router.clone(),
        Request::get("/game/history?player=bob").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], id);
    assert_eq!(body[0]["players"], json!(["alice", "bob"]));
    assert_eq!(body[0]["result"], "X wins");
    assert_eq!(body[0]["board"][0], "X");

    let uri = format!("/game/{id}");
    let (status, _) = send(
        router.clone(),
        Request::delete(uri.as_str()).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        router,
        Request::delete(uri.as_str()).body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health() {
    let (_db, _repo, router) = app();
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
