//! Per-connection outbound queues.
//!
//! Rooms never touch sockets. They push [`ServerEvent`]s into the queue of a
//! connection id, and the socket task drains its own queue.

use crate::protocol::ServerEvent;
use crate::session::ConnectionId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Shared map of connection id to outbound sender.
#[derive(Debug, Clone, Default)]
pub struct Outboxes {
    senders: Arc<Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<ServerEvent>>>>,
}

impl Outboxes {
    /// Creates an empty set of outboxes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a queue for `connection` and returns its receiving end.
    #[instrument(skip(self))]
    pub fn register(&self, connection: ConnectionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(connection, tx);
        debug!("Outbox registered");
        rx
    }

    /// Closes the queue for `connection`.
    #[instrument(skip(self))]
    pub fn unregister(&self, connection: ConnectionId) {
        self.senders
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&connection);
        debug!("Outbox unregistered");
    }

    /// Queues `event` for `connection`. Events for closed connections are dropped.
    pub fn send(&self, connection: ConnectionId, event: ServerEvent) {
        let senders = self.senders.lock().unwrap_or_else(PoisonError::into_inner);
        let delivered = senders
            .get(&connection)
            .is_some_and(|tx| tx.send(event).is_ok());
        if !delivered {
            debug!(%connection, "Dropping event for closed connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_send_reaches_registered_connection_only() {
        let outboxes = Outboxes::new();
        let a = Uuid::new_v4();
        let mut rx = outboxes.register(a);

        let greeting = ServerEvent::Error {
            message: "hi".to_string(),
        };
        outboxes.send(a, greeting.clone());
        outboxes.send(
            Uuid::new_v4(),
            ServerEvent::Error {
                message: "lost".to_string(),
            },
        );

        assert_eq!(rx.try_recv().unwrap(), greeting);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unregister_closes_queue() {
        let outboxes = Outboxes::new();
        let a = Uuid::new_v4();
        let mut rx = outboxes.register(a);
        outboxes.unregister(a);
        outboxes.send(
            a,
            ServerEvent::Error {
                message: "late".to_string(),
            },
        );
        assert!(rx.try_recv().is_err());
    }
}
