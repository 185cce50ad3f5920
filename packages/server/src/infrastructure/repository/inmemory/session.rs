//! InMemory GameSession Repository 実装

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::{CanvasId, GameSession, GameSessionRepository, SessionStatus, StoreError};

/// インメモリ GameSession Repository 実装
///
/// Key: canvas_id
#[derive(Default)]
pub struct InMemoryGameSessionRepository {
    sessions: Mutex<HashMap<String, GameSession>>,
}

impl InMemoryGameSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GameSessionRepository for InMemoryGameSessionRepository {
    async fn get_session(&self, canvas_id: &CanvasId) -> Result<Option<GameSession>, StoreError> {
        let sessions = self.sessions.lock().await;
        Ok(sessions.get(canvas_id.as_str()).cloned())
    }

    async fn transition_status(
        &self,
        canvas_id: &CanvasId,
        from: &[SessionStatus],
        to: SessionStatus,
        at: DateTime<Utc>,
    ) -> Result<GameSession, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let current = sessions
            .get(canvas_id.as_str())
            .map(|s| s.status)
            .unwrap_or(SessionStatus::Stopped);
        if !from.contains(&current) {
            return Err(StoreError::ConditionFailed);
        }

        let session = sessions
            .entry(canvas_id.as_str().to_string())
            .or_insert_with(|| GameSession::stopped(canvas_id.clone()));
        session.status = to;
        session.paused_at = (to == SessionStatus::Paused).then_some(at);
        Ok(session.clone())
    }

    async fn increment_pixel_count(&self, canvas_id: &CanvasId) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .entry(canvas_id.as_str().to_string())
            .or_insert_with(|| GameSession::stopped(canvas_id.clone()));
        session.pixel_count += 1;
        Ok(session.pixel_count)
    }
}
