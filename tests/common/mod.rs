//! Shared helpers for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use strictly_arena::{
    ConnectionId, MatchRecord, Outboxes, RecordError, ResultRecorder, ServerEvent, SessionRegistry,
};
use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

/// Recorder that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    records: Mutex<Vec<MatchRecord>>,
}

impl MemoryRecorder {
    pub fn records(&self) -> Vec<MatchRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResultRecorder for MemoryRecorder {
    async fn record(&self, record: MatchRecord) -> Result<(), RecordError> {
        self.records.lock().unwrap().push(record);
        Ok(())
    }
}

/// Recorder that always fails.
#[derive(Debug, Default)]
pub struct FailingRecorder;

#[async_trait]
impl ResultRecorder for FailingRecorder {
    async fn record(&self, _record: MatchRecord) -> Result<(), RecordError> {
        Err(RecordError::new("disk on fire"))
    }
}

/// A registry wired to in-memory outboxes and recorder.
pub struct Harness {
    pub registry: SessionRegistry,
    pub outboxes: Outboxes,
    pub recorder: Arc<MemoryRecorder>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_ttl(None)
    }

    pub fn with_ttl(idle_ttl: Option<Duration>) -> Self {
        let outboxes = Outboxes::new();
        let recorder = Arc::new(MemoryRecorder::default());
        let registry = SessionRegistry::new(outboxes.clone(), recorder.clone(), idle_ttl);
        Self {
            registry,
            outboxes,
            recorder,
        }
    }

    /// Registers a fresh connection.
    pub fn connect(&self) -> (ConnectionId, UnboundedReceiver<ServerEvent>) {
        let id = Uuid::new_v4();
        let rx = self.outboxes.register(id);
        (id, rx)
    }
}

/// Drains whatever is queued right now.
pub fn drain(rx: &mut UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Waits until `check` holds or a second passes.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
