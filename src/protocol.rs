//! JSON messages exchanged over the realtime socket.
//!
//! Every frame is one JSON object whose `type` field names the event.

use crate::games::tictactoe::{Board, Mark};
use crate::recorder::MatchResult;
use serde::{Deserialize, Serialize};

/// Message sent by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Take a seat in a room, creating it if needed.
    Join {
        /// Room to join.
        room_id: String,
        /// Name shown to the opponent and stored with the result.
        display_name: String,
    },
    /// Place the caller's mark.
    Move {
        /// Room the move targets.
        room_id: String,
        /// Cell 0-8, row-major. Signed so that negative input is rejected as a move, not a frame.
        cell_index: i64,
        /// Mark the client believes it plays.
        #[serde(default)]
        symbol: Option<Mark>,
    },
}

/// Message sent by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// The mark the recipient plays.
    SymbolAssigned {
        /// Assigned mark.
        symbol: Mark,
    },
    /// The recipient opened a new room.
    RoomCreated {
        /// Human-readable note.
        message: String,
    },
    /// A challenger took the second seat.
    OpponentJoined {
        /// Human-readable note.
        message: String,
    },
    /// Both seats were taken.
    RoomFull {
        /// Human-readable note.
        message: String,
    },
    /// Current position.
    BoardUpdate {
        /// Board squares.
        board: Board,
        /// Mark to play.
        turn: Mark,
    },
    /// The match ended.
    MatchFinished {
        /// How it ended.
        result: MatchResult,
        /// Final board.
        board: Board,
    },
    /// The other seat emptied.
    OpponentLeft {
        /// Why.
        reason: String,
    },
    /// Nobody joined before the room's idle timeout.
    RoomExpired {
        /// Human-readable note.
        message: String,
    },
    /// The connection already holds a seat.
    AlreadySeated {
        /// Human-readable note.
        message: String,
    },
    /// The last frame could not be understood.
    Error {
        /// What went wrong.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_frame_parses() {
        let event: ClientEvent = serde_json::from_value(json!({
            "type": "join",
            "roomId": "r1",
            "displayName": "alice"
        }))
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::Join {
                room_id: "r1".to_string(),
                display_name: "alice".to_string()
            }
        );
    }

    #[test]
    fn test_move_frame_symbol_optional() {
        let event: ClientEvent = serde_json::from_value(json!({
            "type": "move",
            "roomId": "r1",
            "cellIndex": -1
        }))
        .unwrap();
        assert!(matches!(
            event,
            ClientEvent::Move {
                cell_index: -1,
                symbol: None,
                ..
            }
        ));
    }

    #[test]
    fn test_board_update_wire_shape() {
        let mut board = Board::new();
        board.place(4, Mark::X).unwrap();
        let value = serde_json::to_value(ServerEvent::BoardUpdate {
            board,
            turn: Mark::O,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "type": "boardUpdate",
                "board": [null, null, null, null, "X", null, null, null, null],
                "turn": "O"
            })
        );
    }

    #[test]
    fn test_match_finished_wire_shape() {
        let value = serde_json::to_value(ServerEvent::MatchFinished {
            result: MatchResult::Draw,
            board: Board::new(),
        })
        .unwrap();
        assert_eq!(value["type"], "matchFinished");
        assert_eq!(value["result"], "draw");
    }

    #[test]
    fn test_symbol_assigned_wire_shape() {
        let event = ServerEvent::SymbolAssigned { symbol: Mark::X };
        let value = serde_json::to_value(event).unwrap();
        assert_eq!(value, json!({"type": "symbolAssigned", "symbol": "X"}));
    }
}
