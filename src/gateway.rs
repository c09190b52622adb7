//! Bridges realtime connections to the session registry.
//!
//! Each socket gets a [`ConnectionId`] and an outbox. Inbound frames are
//! decoded and handled one at a time, so a connection's disconnect always
//! lands after every frame it sent before closing.

use crate::outbox::Outboxes;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::registry::{DisconnectOutcome, SessionRegistry};
use crate::session::{ConnectionId, IgnoreReason, MoveOutcome};
use axum::extract::ws::{Message, WebSocket};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Turns socket traffic into registry calls.
#[derive(Debug, Clone)]
pub struct Gateway {
    registry: SessionRegistry,
    outboxes: Outboxes,
}

impl Gateway {
    /// Creates a gateway over `registry`, delivering through `outboxes`.
    ///
    /// `outboxes` must be the same set the registry was built with.
    pub fn new(registry: SessionRegistry, outboxes: Outboxes) -> Self {
        Self { registry, outboxes }
    }

    /// The registry behind this gateway.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Opens a connection and returns its id with the receiving end of its outbox.
    #[instrument(skip(self))]
    pub fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerEvent>) {
        let connection = Uuid::new_v4();
        let outbox = self.outboxes.register(connection);
        info!(%connection, "Connection opened");
        (connection, outbox)
    }

    /// Decodes and handles one text frame.
    #[instrument(skip(self, frame))]
    pub async fn handle_frame(&self, connection: ConnectionId, frame: &str) {
        match serde_json::from_str::<ClientEvent>(frame) {
            Ok(event) => self.handle_event(connection, event).await,
            Err(e) => {
                warn!(error = %e, "Unreadable frame");
                self.outboxes.send(
                    connection,
                    ServerEvent::Error {
                        message: format!("Invalid message: {}", e),
                    },
                );
            }
        }
    }

    /// Handles one decoded event.
    pub async fn handle_event(&self, connection: ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::Join {
                room_id,
                display_name,
            } => {
                match self
                    .registry
                    .join_or_create(room_id, connection, display_name)
                    .await
                {
                    Ok(admission) => debug!(?admission, "Joined"),
                    Err(e) => debug!(error = %e, "Join refused"),
                }
            }
            ClientEvent::Move {
                room_id,
                cell_index,
                symbol,
            } => {
                let outcome = match usize::try_from(cell_index) {
                    Ok(cell) => {
                        self.registry
                            .apply_move(&room_id, connection, cell, symbol)
                            .await
                    }
                    Err(_) => MoveOutcome::Ignored(IgnoreReason::OutOfBounds),
                };
                if let MoveOutcome::Ignored(reason) = outcome {
                    debug!(%room_id, cell_index, %reason, "Move ignored");
                }
            }
        }
    }

    /// Closes a connection, vacating its seat.
    #[instrument(skip(self))]
    pub async fn disconnect(&self, connection: ConnectionId) -> DisconnectOutcome {
        let outcome = self.registry.disconnect(connection).await;
        self.outboxes.unregister(connection);
        info!(?outcome, "Connection closed");
        outcome
    }

    /// Drives one websocket until either side closes it.
    pub async fn serve_socket(self, mut socket: WebSocket) {
        let (connection, mut outbox) = self.connect();

        loop {
            tokio::select! {
                Some(event) = outbox.recv() => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(error = %e, "Failed to encode event");
                            continue;
                        }
                    };
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                incoming = socket.recv() => {
                    match incoming {
                        Some(Ok(Message::Text(text))) => {
                            self.handle_frame(connection, text.as_str()).await;
                        }
                        Some(Ok(Message::Close(_))) | None => break,
                        Some(Err(e)) => {
                            debug!(%connection, error = %e, "Socket error");
                            break;
                        }
                        _ => continue,
                    }
                }
            }
        }

        self.disconnect(connection).await;
    }
}
