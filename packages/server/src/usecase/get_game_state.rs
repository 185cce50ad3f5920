//! UseCase: ゲームの状態（セッション・接続数・最新スナップショット）を取得

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{CanvasId, GameSession, GameSessionRepository, SnapshotRepository, StoreError};

use super::{connection_registry::ConnectionRegistry, error::RegistryError};

/// ゲームの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub session: GameSession,
    /// 接続中のユニークな client_id の数
    pub active_connections: usize,
    pub last_snapshot_at: Option<DateTime<Utc>>,
}

/// ゲーム状態取得のユースケース
pub struct GetGameStateUseCase {
    session_repository: Arc<dyn GameSessionRepository>,
    snapshot_repository: Arc<dyn SnapshotRepository>,
    registry: Arc<ConnectionRegistry>,
    canvas_id: CanvasId,
}

impl GetGameStateUseCase {
    pub fn new(
        session_repository: Arc<dyn GameSessionRepository>,
        snapshot_repository: Arc<dyn SnapshotRepository>,
        registry: Arc<ConnectionRegistry>,
        canvas_id: CanvasId,
    ) -> Self {
        Self {
            session_repository,
            snapshot_repository,
            registry,
            canvas_id,
        }
    }

    pub async fn execute(&self) -> Result<GameState, StoreError> {
        let session = self
            .session_repository
            .get_session(&self.canvas_id)
            .await?
            .unwrap_or_else(|| GameSession::stopped(self.canvas_id.clone()));
        let active_connections = self
            .registry
            .count_unique_clients()
            .await
            .map_err(|RegistryError::Storage(e)| e)?;
        let last_snapshot_at = self
            .snapshot_repository
            .list_snapshots(&self.canvas_id, 1)
            .await?
            .first()
            .map(|record| record.created_at);

        Ok(GameState {
            session,
            active_connections,
            last_snapshot_at,
        })
    }
}
