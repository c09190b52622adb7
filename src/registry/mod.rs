//! Live rooms keyed by room id.
//!
//! Each room runs as its own task owning a [`Session`]; the registry only
//! keeps a directory of inboxes and which connection sits where. Commands for
//! a room are enqueued while the directory lock is held, so the order callers
//! reach the registry is the order the room processes them. The lock is
//! never held across an await.

mod room;

use crate::games::tictactoe::Mark;
use crate::outbox::Outboxes;
use crate::recorder::ResultRecorder;
use crate::session::{
    Admission, ConnectionId, IgnoreReason, JoinError, MoveOutcome, RoomId, Session,
};
use room::{RoomActor, RoomCommand, rejection_event};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument};

/// What a disconnect did to the room the connection sat in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisconnectOutcome {
    /// The connection held no seat.
    NoOp,
    /// The host left and the room was destroyed.
    HostLeft(RoomId),
    /// The challenger left and the room reopened.
    ChallengerLeft(RoomId),
}

struct RoomEntry {
    generation: u64,
    inbox: mpsc::UnboundedSender<RoomCommand>,
}

#[derive(Default)]
pub(crate) struct Directory {
    rooms: HashMap<RoomId, RoomEntry>,
    seats: HashMap<ConnectionId, RoomId>,
    next_generation: u64,
}

fn lock(directory: &Mutex<Directory>) -> MutexGuard<'_, Directory> {
    directory.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns every live room.
#[derive(Clone)]
pub struct SessionRegistry {
    directory: Arc<Mutex<Directory>>,
    outboxes: Outboxes,
    recorder: Arc<dyn ResultRecorder>,
    idle_ttl: Option<Duration>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("live_rooms", &self.live_rooms())
            .field("idle_ttl", &self.idle_ttl)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    /// Creates an empty registry.
    ///
    /// Events for players go through `outboxes`; finished matches go to
    /// `recorder`. With `idle_ttl` set, a room whose challenger seat stays
    /// empty that long without any activity is closed.
    #[instrument(skip(outboxes, recorder))]
    pub fn new(
        outboxes: Outboxes,
        recorder: Arc<dyn ResultRecorder>,
        idle_ttl: Option<Duration>,
    ) -> Self {
        info!("Creating session registry");
        Self {
            directory: Arc::new(Mutex::new(Directory::default())),
            outboxes,
            recorder,
            idle_ttl,
        }
    }

    /// Seats `connection` in `room_id`, opening the room if it does not exist.
    ///
    /// The first joiner becomes host (X); the second becomes challenger (O).
    ///
    /// # Errors
    ///
    /// [`JoinError::RoomFull`] when both seats are taken, and
    /// [`JoinError::AlreadySeated`] when `connection` already sits in a room.
    #[instrument(skip(self, name), fields(player = %name))]
    pub async fn join_or_create(
        &self,
        room_id: RoomId,
        connection: ConnectionId,
        name: String,
    ) -> Result<Admission, JoinError> {
        loop {
            let reply = {
                let mut directory = lock(&self.directory);

                if directory.seats.contains_key(&connection) {
                    debug!("Connection already seated");
                    self.outboxes
                        .send(connection, rejection_event(JoinError::AlreadySeated));
                    return Err(JoinError::AlreadySeated);
                }

                let Some(inbox) = directory.rooms.get(&room_id).map(|e| e.inbox.clone()) else {
                    return Ok(self.open_room(&mut directory, room_id, connection, name));
                };

                let (tx, rx) = oneshot::channel();
                let command = RoomCommand::Join {
                    connection,
                    name: name.clone(),
                    reply: tx,
                };
                if inbox.send(command).is_err() {
                    debug!("Stale room entry, reopening");
                    directory.rooms.remove(&room_id);
                    continue;
                }
                rx
            };

            match reply.await {
                Ok(result) => return result,
                Err(_) => debug!("Room closed before answering join, retrying"),
            }
        }
    }

    fn open_room(
        &self,
        directory: &mut Directory,
        room_id: RoomId,
        connection: ConnectionId,
        name: String,
    ) -> Admission {
        let generation = directory.next_generation;
        directory.next_generation += 1;

        let session = Session::new(room_id.clone(), connection, name);
        let admission = session.host_admission();
        let (tx, rx) = mpsc::unbounded_channel();

        directory.rooms.insert(
            room_id.clone(),
            RoomEntry {
                generation,
                inbox: tx,
            },
        );
        directory.seats.insert(connection, room_id);

        let actor = RoomActor {
            session,
            generation,
            inbox: rx,
            directory: Arc::clone(&self.directory),
            outboxes: self.outboxes.clone(),
            recorder: Arc::clone(&self.recorder),
            idle_ttl: self.idle_ttl,
        };
        actor.greet_host();
        tokio::spawn(actor.run());

        admission
    }

    /// Applies a move by `connection` in `room_id`.
    ///
    /// Anything that cannot be applied comes back as [`MoveOutcome::Ignored`]
    /// and leaves the room untouched.
    #[instrument(skip(self))]
    pub async fn apply_move(
        &self,
        room_id: &str,
        connection: ConnectionId,
        cell: usize,
        declared: Option<Mark>,
    ) -> MoveOutcome {
        let reply = {
            let directory = lock(&self.directory);
            let Some(entry) = directory.rooms.get(room_id) else {
                debug!("Move for unknown room");
                return MoveOutcome::Ignored(IgnoreReason::NoSession);
            };

            let (tx, rx) = oneshot::channel();
            let command = RoomCommand::Move {
                connection,
                cell,
                declared,
                reply: tx,
            };
            if entry.inbox.send(command).is_err() {
                return MoveOutcome::Ignored(IgnoreReason::NoSession);
            }
            rx
        };

        reply
            .await
            .unwrap_or(MoveOutcome::Ignored(IgnoreReason::NoSession))
    }

    /// Removes `connection` from whatever room it sits in.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, connection: ConnectionId) -> DisconnectOutcome {
        let reply = {
            let directory = lock(&self.directory);
            let Some(entry) = directory
                .seats
                .get(&connection)
                .and_then(|room_id| directory.rooms.get(room_id))
            else {
                return DisconnectOutcome::NoOp;
            };

            let (tx, rx) = oneshot::channel();
            if entry
                .inbox
                .send(RoomCommand::Leave {
                    connection,
                    reply: tx,
                })
                .is_err()
            {
                return DisconnectOutcome::NoOp;
            }
            rx
        };

        let outcome = reply.await.unwrap_or(DisconnectOutcome::NoOp);
        debug!(?outcome, "Disconnect handled");
        outcome
    }

    /// Copy of a room's current session, if the room is live.
    pub async fn snapshot(&self, room_id: &str) -> Option<Session> {
        let reply = {
            let directory = lock(&self.directory);
            let entry = directory.rooms.get(room_id)?;
            let (tx, rx) = oneshot::channel();
            entry.inbox.send(RoomCommand::Snapshot { reply: tx }).ok()?;
            rx
        };
        reply.await.ok()
    }

    /// Room the connection is seated in.
    pub fn room_of(&self, connection: ConnectionId) -> Option<RoomId> {
        lock(&self.directory).seats.get(&connection).cloned()
    }

    /// Number of live rooms.
    pub fn live_rooms(&self) -> usize {
        lock(&self.directory).rooms.len()
    }
}
