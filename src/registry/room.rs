//! The task that owns one room.

use super::{DisconnectOutcome, Directory, lock};
use crate::games::tictactoe::Mark;
use crate::outbox::Outboxes;
use crate::protocol::ServerEvent;
use crate::recorder::{MatchResult, ResultRecorder};
use crate::session::{
    Admission, ConnectionId, Departure, JoinError, MoveOutcome, Session, SessionStatus,
};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, instrument, warn};

const ROOM_CREATED: &str = "You have created the room. It's your turn!";
const OPPONENT_JOINED: &str = "Your opponent has joined the room.";
const ROOM_FULL: &str = "Room is full!";
const ALREADY_SEATED: &str = "You are already seated in a room.";
const HOST_LEFT: &str = "The host has left the game. Room is closed.";
const CHALLENGER_LEFT: &str = "Your opponent left the room. Waiting for the opponent.";
const ROOM_EXPIRED: &str = "No opponent joined in time. Room is closed.";

/// Request handled by a room task. Each carries its own reply channel.
#[derive(Debug)]
pub(crate) enum RoomCommand {
    Join {
        connection: ConnectionId,
        name: String,
        reply: oneshot::Sender<Result<Admission, JoinError>>,
    },
    Move {
        connection: ConnectionId,
        cell: usize,
        declared: Option<Mark>,
        reply: oneshot::Sender<MoveOutcome>,
    },
    Leave {
        connection: ConnectionId,
        reply: oneshot::Sender<DisconnectOutcome>,
    },
    Snapshot {
        reply: oneshot::Sender<Session>,
    },
}

enum Wake {
    Command(RoomCommand),
    Expired,
    Closed,
}

/// Event sent to a joiner whose join was refused.
pub(crate) fn rejection_event(err: JoinError) -> ServerEvent {
    match err {
        JoinError::RoomFull => ServerEvent::RoomFull {
            message: ROOM_FULL.to_string(),
        },
        JoinError::AlreadySeated => ServerEvent::AlreadySeated {
            message: ALREADY_SEATED.to_string(),
        },
    }
}

pub(crate) struct RoomActor {
    pub(crate) session: Session,
    pub(crate) generation: u64,
    pub(crate) inbox: mpsc::UnboundedReceiver<RoomCommand>,
    pub(crate) directory: Arc<Mutex<Directory>>,
    pub(crate) outboxes: Outboxes,
    pub(crate) recorder: Arc<dyn ResultRecorder>,
    pub(crate) idle_ttl: Option<Duration>,
}

impl RoomActor {
    /// Runs until the room finishes, the host leaves, or the room expires.
    #[instrument(skip(self), fields(room_id = %self.session.room_id(), generation = self.generation))]
    pub(crate) async fn run(mut self) {
        info!("Room opened");

        loop {
            let command = match self.next_wake().await {
                Wake::Command(command) => command,
                Wake::Expired => {
                    info!("No challenger arrived before the idle timeout");
                    let host = *self.session.host().connection();
                    self.outboxes.send(
                        host,
                        ServerEvent::RoomExpired {
                            message: ROOM_EXPIRED.to_string(),
                        },
                    );
                    self.close();
                    break;
                }
                Wake::Closed => {
                    warn!("Room inbox closed unexpectedly");
                    self.close();
                    break;
                }
            };

            if self.handle(command).is_break() {
                break;
            }
        }

        // Dropping the inbox fails every queued reply, which callers read as "room gone".
        self.inbox.close();
        info!("Room closed");
    }

    async fn next_wake(&mut self) -> Wake {
        let ttl = self
            .idle_ttl
            .filter(|_| *self.session.status() == SessionStatus::AwaitingChallenger);

        match ttl {
            Some(ttl) => match tokio::time::timeout(ttl, self.inbox.recv()).await {
                Ok(Some(command)) => Wake::Command(command),
                Ok(None) => Wake::Closed,
                Err(_) => Wake::Expired,
            },
            None => match self.inbox.recv().await {
                Some(command) => Wake::Command(command),
                None => Wake::Closed,
            },
        }
    }

    /// Tells the host their mark and that the room exists.
    pub(super) fn greet_host(&self) {
        let host = self.session.host();
        self.outboxes.send(
            *host.connection(),
            ServerEvent::SymbolAssigned {
                symbol: *host.mark(),
            },
        );
        self.outboxes.send(
            *host.connection(),
            ServerEvent::RoomCreated {
                message: ROOM_CREATED.to_string(),
            },
        );
    }

    fn handle(&mut self, command: RoomCommand) -> ControlFlow<()> {
        match command {
            RoomCommand::Join {
                connection,
                name,
                reply,
            } => {
                let result = self.join(connection, name);
                let _ = reply.send(result);
                ControlFlow::Continue(())
            }
            RoomCommand::Move {
                connection,
                cell,
                declared,
                reply,
            } => {
                let outcome = self.session.apply_move(connection, cell, declared);
                let flow = self.after_move(&outcome);
                let _ = reply.send(outcome);
                flow
            }
            RoomCommand::Leave { connection, reply } => {
                let (outcome, flow) = self.leave(connection);
                let _ = reply.send(outcome);
                flow
            }
            RoomCommand::Snapshot { reply } => {
                let _ = reply.send(self.session.clone());
                ControlFlow::Continue(())
            }
        }
    }

    fn join(&mut self, connection: ConnectionId, name: String) -> Result<Admission, JoinError> {
        let admission = match self.session.admit(connection, name) {
            Ok(admission) => admission,
            Err(e) => {
                debug!(%connection, error = %e, "Join rejected");
                self.outboxes.send(connection, rejection_event(e));
                return Err(e);
            }
        };

        lock(&self.directory)
            .seats
            .insert(connection, self.session.room_id().clone());

        self.outboxes.send(
            connection,
            ServerEvent::SymbolAssigned {
                symbol: admission.mark,
            },
        );
        self.outboxes.send(
            connection,
            ServerEvent::BoardUpdate {
                board: *self.session.board(),
                turn: *self.session.turn(),
            },
        );
        self.outboxes.send(
            *self.session.host().connection(),
            ServerEvent::OpponentJoined {
                message: OPPONENT_JOINED.to_string(),
            },
        );
        Ok(admission)
    }

    fn after_move(&mut self, outcome: &MoveOutcome) -> ControlFlow<()> {
        match outcome {
            MoveOutcome::Accepted { board, turn } => {
                self.broadcast(ServerEvent::BoardUpdate {
                    board: *board,
                    turn: *turn,
                });
                ControlFlow::Continue(())
            }
            MoveOutcome::Finished { result, board } => {
                self.broadcast(ServerEvent::BoardUpdate {
                    board: *board,
                    turn: self.session.turn().opponent(),
                });
                self.broadcast(ServerEvent::MatchFinished {
                    result: *result,
                    board: *board,
                });
                self.persist(*result);
                self.close();
                ControlFlow::Break(())
            }
            MoveOutcome::Ignored(reason) => {
                debug!(%reason, "Move ignored");
                ControlFlow::Continue(())
            }
        }
    }

    fn leave(&mut self, connection: ConnectionId) -> (DisconnectOutcome, ControlFlow<()>) {
        let room_id = self.session.room_id().clone();
        match self.session.depart(connection) {
            Departure::Host => {
                if let Some(challenger) = self.session.challenger() {
                    self.outboxes.send(
                        *challenger.connection(),
                        ServerEvent::OpponentLeft {
                            reason: HOST_LEFT.to_string(),
                        },
                    );
                }
                self.close();
                (DisconnectOutcome::HostLeft(room_id), ControlFlow::Break(()))
            }
            Departure::Challenger => {
                self.release_seat(connection);
                self.outboxes.send(
                    *self.session.host().connection(),
                    ServerEvent::OpponentLeft {
                        reason: CHALLENGER_LEFT.to_string(),
                    },
                );
                (
                    DisconnectOutcome::ChallengerLeft(room_id),
                    ControlFlow::Continue(()),
                )
            }
            Departure::NotSeated => (DisconnectOutcome::NoOp, ControlFlow::Continue(())),
        }
    }

    fn broadcast(&self, event: ServerEvent) {
        for seat in self.session.seats() {
            self.outboxes.send(*seat.connection(), event.clone());
        }
    }

    fn persist(&self, result: MatchResult) {
        let record = self.session.match_record(result);
        let recorder = Arc::clone(&self.recorder);
        tokio::spawn(async move {
            if let Err(e) = recorder.record(record).await {
                error!(error = %e, "Failed to record match result");
            }
        });
    }

    fn release_seat(&self, connection: ConnectionId) {
        let mut directory = lock(&self.directory);
        if directory.seats.get(&connection) == Some(self.session.room_id()) {
            directory.seats.remove(&connection);
        }
    }

    /// Removes this room and its seats from the directory.
    fn close(&self) {
        let room_id = self.session.room_id();
        let mut directory = lock(&self.directory);

        if directory
            .rooms
            .get(room_id)
            .is_some_and(|entry| entry.generation == self.generation)
        {
            directory.rooms.remove(room_id);
        }
        for seat in self.session.seats() {
            if directory.seats.get(seat.connection()) == Some(room_id) {
                directory.seats.remove(seat.connection());
            }
        }
        debug!(live_rooms = directory.rooms.len(), "Room removed from directory");
    }
}
