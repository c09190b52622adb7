//! A single match: two seats, a board, whose turn it is, and where the match
//! is in its lifecycle.
//!
//! `Session` is plain data mutated only through validated transitions. It
//! knows nothing about sockets, tasks or storage; the room actor in
//! [`crate::registry`] owns one and turns its outcomes into outbound events.

use crate::games::tictactoe::{Board, Mark, is_draw, winner};
use crate::recorder::{MatchRecord, MatchResult};
use chrono::Utc;
use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Room identifier chosen by the clients.
pub type RoomId = String;

/// Identity of one live connection, assigned by the gateway.
pub type ConnectionId = Uuid;

/// Which seat a player holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// First seat; created the room and plays X.
    Host,
    /// Second seat; plays O.
    Challenger,
}

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Only the host is seated.
    AwaitingChallenger,
    /// Both seats filled; moves are accepted.
    InProgress,
    /// A line was completed or the board filled.
    Finished,
}

/// A seated player.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Seat {
    connection: ConnectionId,
    name: String,
    mark: Mark,
}

/// Seat assignment returned to a successful joiner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    /// Seat taken.
    pub role: Role,
    /// Mark assigned to that seat.
    pub mark: Mark,
}

/// Why a join was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Error)]
pub enum JoinError {
    /// Both seats are taken.
    #[display("Room is full!")]
    RoomFull,
    /// The connection already holds a seat in a live room.
    #[display("You are already seated in a room")]
    AlreadySeated,
}

/// Why a move was dropped without changing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum IgnoreReason {
    /// No live session for the room.
    #[display("no active session")]
    NoSession,
    /// Session is not accepting moves.
    #[display("session not in progress")]
    NotInProgress,
    /// Connection holds no seat in this session.
    #[display("connection not seated")]
    NotSeated,
    /// The mover's mark is not the one to play.
    #[display("not this player's turn")]
    NotYourTurn,
    /// The client declared a mark other than its seat's.
    #[display("declared mark does not match seat")]
    MarkMismatch,
    /// Cell index outside 0-8.
    #[display("cell out of bounds")]
    OutOfBounds,
    /// Target square already holds a mark.
    #[display("square occupied")]
    SquareOccupied,
}

/// Result of applying a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Mark placed; play continues with `turn`.
    Accepted {
        /// Board after the move.
        board: Board,
        /// Mark to play next.
        turn: Mark,
    },
    /// Mark placed and the match is over.
    Finished {
        /// How it ended.
        result: MatchResult,
        /// Final board.
        board: Board,
    },
    /// Nothing changed.
    Ignored(IgnoreReason),
}

/// Which seat, if any, a departing connection held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The host left; the session must be destroyed.
    Host,
    /// The challenger left; the session waits for a new one.
    Challenger,
    /// The connection held no seat.
    NotSeated,
}

/// One match between a host and an optional challenger.
#[derive(Debug, Clone, Getters)]
pub struct Session {
    room_id: RoomId,
    host: Seat,
    challenger: Option<Seat>,
    board: Board,
    turn: Mark,
    status: SessionStatus,
}

impl Session {
    /// Creates a session with the host seated as X.
    #[instrument(skip(name))]
    pub fn new(room_id: RoomId, connection: ConnectionId, name: String) -> Self {
        info!(room_id = %room_id, host = %name, "Creating new session");
        Self {
            room_id,
            host: Seat {
                connection,
                name,
                mark: Mark::X,
            },
            challenger: None,
            board: Board::new(),
            turn: Mark::X,
            status: SessionStatus::AwaitingChallenger,
        }
    }

    /// Admission the host received when the session was created.
    pub fn host_admission(&self) -> Admission {
        Admission {
            role: Role::Host,
            mark: self.host.mark,
        }
    }

    /// Seats a challenger as O and starts play.
    ///
    /// # Errors
    ///
    /// Returns [`JoinError::RoomFull`] if the challenger seat is taken or the
    /// match is over, and [`JoinError::AlreadySeated`] if `connection` is the host.
    #[instrument(skip(self, name), fields(room_id = %self.room_id))]
    pub fn admit(
        &mut self,
        connection: ConnectionId,
        name: String,
    ) -> Result<Admission, JoinError> {
        if self.host.connection == connection {
            warn!("Host tried to take the challenger seat");
            return Err(JoinError::AlreadySeated);
        }
        if self.challenger.is_some() || self.status == SessionStatus::Finished {
            warn!(joiner = %name, "Session already has 2 players");
            return Err(JoinError::RoomFull);
        }

        info!(challenger = %name, "Registering challenger as O");
        self.challenger = Some(Seat {
            connection,
            name,
            mark: Mark::O,
        });
        self.status = SessionStatus::InProgress;

        Ok(Admission {
            role: Role::Challenger,
            mark: Mark::O,
        })
    }

    /// Gets the seat held by `connection`.
    pub fn seat_of(&self, connection: ConnectionId) -> Option<&Seat> {
        std::iter::once(&self.host)
            .chain(self.challenger.as_ref())
            .find(|seat| seat.connection == connection)
    }

    /// Iterates the occupied seats, host first.
    pub fn seats(&self) -> impl Iterator<Item = &Seat> {
        std::iter::once(&self.host).chain(self.challenger.as_ref())
    }

    /// Applies a move by `connection` at `cell`.
    ///
    /// `declared` is the mark the client claims to play; when present it must
    /// match the seat. Illegal moves leave the session untouched.
    #[instrument(skip(self), fields(room_id = %self.room_id))]
    pub fn apply_move(
        &mut self,
        connection: ConnectionId,
        cell: usize,
        declared: Option<Mark>,
    ) -> MoveOutcome {
        if let Err(reason) = self.check_move(connection, cell, declared) {
            debug!(%reason, "Move ignored");
            return MoveOutcome::Ignored(reason);
        }

        let mark = self.turn;
        if let Err(e) = self.board.place(cell, mark) {
            // check_move already ruled this out
            warn!(error = %e, "Placement rejected after validation");
            return MoveOutcome::Ignored(IgnoreReason::SquareOccupied);
        }

        if let Some(mark) = winner(&self.board) {
            self.status = SessionStatus::Finished;
            info!(winner = %mark, "Match won");
            return MoveOutcome::Finished {
                result: MatchResult::from_winner(Some(mark)),
                board: self.board,
            };
        }

        if is_draw(&self.board) {
            self.status = SessionStatus::Finished;
            info!("Match drawn");
            return MoveOutcome::Finished {
                result: MatchResult::Draw,
                board: self.board,
            };
        }

        self.turn = mark.opponent();
        debug!(cell, next = %self.turn, "Move accepted");
        MoveOutcome::Accepted {
            board: self.board,
            turn: self.turn,
        }
    }

    fn check_move(
        &self,
        connection: ConnectionId,
        cell: usize,
        declared: Option<Mark>,
    ) -> Result<(), IgnoreReason> {
        if self.status != SessionStatus::InProgress {
            return Err(IgnoreReason::NotInProgress);
        }
        let seat = self.seat_of(connection).ok_or(IgnoreReason::NotSeated)?;
        if declared.is_some_and(|mark| mark != seat.mark) {
            return Err(IgnoreReason::MarkMismatch);
        }
        if seat.mark != self.turn {
            return Err(IgnoreReason::NotYourTurn);
        }
        match self.board.get(cell) {
            None => Err(IgnoreReason::OutOfBounds),
            Some(_) if !self.board.is_empty(cell) => Err(IgnoreReason::SquareOccupied),
            Some(_) => Ok(()),
        }
    }

    /// Removes `connection` from its seat.
    ///
    /// A departing challenger reopens the seat and the session returns to
    /// [`SessionStatus::AwaitingChallenger`]; board and turn are kept so the
    /// next challenger resumes the position. A departing host means the
    /// caller must destroy the session.
    #[instrument(skip(self), fields(room_id = %self.room_id))]
    pub fn depart(&mut self, connection: ConnectionId) -> Departure {
        if self.host.connection == connection {
            info!(host = %self.host.name, "Host left");
            return Departure::Host;
        }

        match &self.challenger {
            Some(seat) if seat.connection == connection => {
                info!(challenger = %seat.name, "Challenger left, reopening seat");
                self.challenger = None;
                if self.status == SessionStatus::InProgress {
                    self.status = SessionStatus::AwaitingChallenger;
                }
                Departure::Challenger
            }
            _ => Departure::NotSeated,
        }
    }

    /// Builds the record persisted for a finished match.
    pub fn match_record(&self, result: MatchResult) -> MatchRecord {
        let challenger = self
            .challenger
            .as_ref()
            .map(|seat| seat.name.clone())
            .unwrap_or_default();
        MatchRecord::new(
            [self.host.name.clone(), challenger],
            self.board,
            result,
            Utc::now(),
        )
    }
}
