//! UseCase: スナップショットの要求をキューに積む

use std::sync::Arc;

use pixelwar_shared::time::Clock;
use uuid::Uuid;

use crate::domain::{MessageQueue, SnapshotRequest};

use super::error::SnapshotError;

/// スナップショット要求のユースケース
pub struct RequestSnapshotUseCase {
    snapshot_queue: Arc<dyn MessageQueue>,
    clock: Arc<dyn Clock>,
}

impl RequestSnapshotUseCase {
    pub fn new(snapshot_queue: Arc<dyn MessageQueue>, clock: Arc<dyn Clock>) -> Self {
        Self {
            snapshot_queue,
            clock,
        }
    }

    /// 要求を積み、要求 ID を返す（処理はワーカーで非同期に行われる）
    pub async fn execute(
        &self,
        requested_by: &str,
        callback_url: Option<String>,
    ) -> Result<Uuid, SnapshotError> {
        let request = SnapshotRequest {
            request_id: Uuid::new_v4(),
            requested_by: requested_by.to_string(),
            requested_at: self.clock.now(),
            callback_url: callback_url.filter(|url| !url.trim().is_empty()),
        };
        let body =
            serde_json::to_string(&request).map_err(|e| SnapshotError::Transport(e.into()))?;
        self.snapshot_queue
            .send(body)
            .await
            .map_err(SnapshotError::Transport)?;

        tracing::info!(
            "Snapshot {} requested by '{}'",
            request.request_id,
            requested_by
        );
        Ok(request.request_id)
    }
}
