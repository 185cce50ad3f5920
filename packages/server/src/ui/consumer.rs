//! Background consumers: the draw and snapshot queue workers and the topic fan-out subscriber.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};

use crate::{
    domain::{CanvasEvent, DrawMessage, EventParseError, SnapshotRequest},
    infrastructure::queue::{ConsumeError, MessageHandler},
    usecase::{BroadcastFanout, ProcessDrawUseCase, RenderSnapshotUseCase, SnapshotError},
};

/// Maximum number of topic events delivered in one fan-out pass
pub const FANOUT_BATCH_SIZE: usize = 100;

/// Draw queue worker
pub struct DrawQueueHandler {
    usecase: Arc<ProcessDrawUseCase>,
}

impl DrawQueueHandler {
    pub fn new(usecase: Arc<ProcessDrawUseCase>) -> Self {
        Self { usecase }
    }
}

#[async_trait]
impl MessageHandler for DrawQueueHandler {
    async fn handle(&self, body: &str) -> Result<(), ConsumeError> {
        let message: DrawMessage = serde_json::from_str(body).map_err(|e| {
            tracing::error!("Malformed draw message: {}", e);
            ConsumeError::Malformed(e.to_string())
        })?;
        self.usecase
            .execute(message)
            .await
            .map(|_| ())
            .map_err(|e| ConsumeError::Retryable(e.to_string()))
    }
}

/// Snapshot queue worker
pub struct SnapshotQueueHandler {
    usecase: Arc<RenderSnapshotUseCase>,
}

impl SnapshotQueueHandler {
    pub fn new(usecase: Arc<RenderSnapshotUseCase>) -> Self {
        Self { usecase }
    }
}

#[async_trait]
impl MessageHandler for SnapshotQueueHandler {
    async fn handle(&self, body: &str) -> Result<(), ConsumeError> {
        let request: SnapshotRequest = serde_json::from_str(body).map_err(|e| {
            tracing::error!("Malformed snapshot request: {}", e);
            ConsumeError::Malformed(e.to_string())
        })?;
        match self.usecase.execute(request).await {
            Ok(_) => Ok(()),
            // Encoding fails the same way on every attempt
            Err(e @ SnapshotError::Encode(_)) => Err(ConsumeError::Malformed(e.to_string())),
            Err(e) => Err(ConsumeError::Retryable(e.to_string())),
        }
    }
}

/// Subscribe to the topic and fan every event out to the live connections
///
/// Events already waiting in the subscription are delivered together, up to
/// [`FANOUT_BATCH_SIZE`] per pass. Events with an unknown `type` are skipped.
/// Delivery is at-most-once: events overwritten while the subscriber lags are lost for every
/// viewer.
pub async fn run_fanout_subscriber(
    mut receiver: broadcast::Receiver<String>,
    fanout: Arc<BroadcastFanout>,
) {
    tracing::info!("Fan-out subscriber started");
    loop {
        let first = match receiver.recv().await {
            Ok(raw) => raw,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Fan-out subscriber lagged, {} event(s) skipped", skipped);
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        let mut batch = Vec::new();
        push_if_known(&mut batch, first);
        while batch.len() < FANOUT_BATCH_SIZE {
            match receiver.try_recv() {
                Ok(raw) => push_if_known(&mut batch, raw),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Fan-out subscriber lagged, {} event(s) skipped", skipped);
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        if batch.is_empty() {
            continue;
        }

        if let Err(e) = fanout.deliver(&batch).await {
            tracing::error!("Fan-out of {} event(s) failed: {}", batch.len(), e);
        }
    }
    tracing::info!("Fan-out subscriber stopped");
}

fn push_if_known(batch: &mut Vec<String>, raw: String) {
    match CanvasEvent::parse(&raw) {
        Ok(_) => batch.push(raw),
        Err(EventParseError::UnknownType(event_type)) => {
            tracing::warn!("Skipping event of unknown type '{}'", event_type);
        }
        Err(e) => tracing::warn!("Skipping unparsable event: {}", e),
    }
}
