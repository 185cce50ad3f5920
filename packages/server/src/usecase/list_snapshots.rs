//! UseCase: スナップショット一覧の取得

use std::sync::Arc;

use crate::domain::{CanvasId, SnapshotRecord, SnapshotRepository};

use super::error::SnapshotError;

/// `limit` 未指定時の件数
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 20;

/// 一度に返す最大件数
pub const MAX_SNAPSHOT_LIMIT: usize = 100;

/// スナップショット一覧のユースケース
pub struct ListSnapshotsUseCase {
    repository: Arc<dyn SnapshotRepository>,
    canvas_id: CanvasId,
}

impl ListSnapshotsUseCase {
    pub fn new(repository: Arc<dyn SnapshotRepository>, canvas_id: CanvasId) -> Self {
        Self {
            repository,
            canvas_id,
        }
    }

    /// 新しい順に最大 `limit` 件
    pub async fn execute(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<SnapshotRecord>, SnapshotError> {
        let limit = limit
            .unwrap_or(DEFAULT_SNAPSHOT_LIMIT)
            .clamp(1, MAX_SNAPSHOT_LIMIT);
        self.repository
            .list_snapshots(&self.canvas_id, limit)
            .await
            .map_err(SnapshotError::Storage)
    }
}
