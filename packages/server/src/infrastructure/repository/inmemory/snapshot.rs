//! InMemory Snapshot Repository 実装

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{CanvasId, SnapshotRecord, SnapshotRepository, StoreError};

/// インメモリ Snapshot Repository 実装
#[derive(Default)]
pub struct InMemorySnapshotRepository {
    records: Mutex<Vec<SnapshotRecord>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepository {
    async fn put_snapshot(&self, record: SnapshotRecord) -> Result<(), StoreError> {
        let mut records = self.records.lock().await;
        records.retain(|r| r.snapshot_id != record.snapshot_id);
        records.push(record);
        Ok(())
    }

    async fn list_snapshots(
        &self,
        canvas_id: &CanvasId,
        limit: usize,
    ) -> Result<Vec<SnapshotRecord>, StoreError> {
        let records = self.records.lock().await;
        let mut matching: Vec<SnapshotRecord> = records
            .iter()
            .filter(|r| &r.canvas_id == canvas_id)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching.truncate(limit);
        Ok(matching)
    }
}
