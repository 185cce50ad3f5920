//! UseCase: ゲームセッションの一時停止・再開
//!
//! 状態遷移はストアの条件付き更新で行う。すでに目的の状態にある場合も
//! イベントは発行し直すため、発行に失敗した操作は再試行で収束する。
//!
//! | 操作     | 遷移元               | 遷移先  | イベント          |
//! |----------|----------------------|---------|-------------------|
//! | pause    | RUNNING              | PAUSED  | `session.paused`  |
//! | pause    | PAUSED               | （なし）| `session.paused`  |
//! | pause    | STOPPED              | エラー  | なし              |
//! | resume   | PAUSED, STOPPED      | RUNNING | `session.resumed` |
//! | resume   | RUNNING              | （なし）| `session.resumed` |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use pixelwar_shared::time::Clock;

use crate::domain::{
    CanvasEvent, CanvasId, EventPublisher, GameSession, GameSessionRepository, SessionStatus,
    StoreError,
};

use super::error::SessionGateError;

/// セッション状態遷移のユースケース
pub struct SessionGateUseCase {
    repository: Arc<dyn GameSessionRepository>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    canvas_id: CanvasId,
}

impl SessionGateUseCase {
    pub fn new(
        repository: Arc<dyn GameSessionRepository>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        canvas_id: CanvasId,
    ) -> Self {
        Self {
            repository,
            publisher,
            clock,
            canvas_id,
        }
    }

    /// 現在のセッション（行がなければ STOPPED）
    pub async fn current_session(&self) -> Result<GameSession, SessionGateError> {
        let session = self
            .repository
            .get_session(&self.canvas_id)
            .await
            .map_err(SessionGateError::Storage)?;
        Ok(session.unwrap_or_else(|| GameSession::stopped(self.canvas_id.clone())))
    }

    /// RUNNING → PAUSED
    ///
    /// すでに PAUSED の場合は状態を変えず、`session.paused` だけを発行し直す。
    /// 発行に失敗した pause を再試行すれば、イベントが必ず一度は届く。
    pub async fn pause(&self, triggered_by: &str) -> Result<GameSession, SessionGateError> {
        let now = self.clock.now();
        match self
            .repository
            .transition_status(
                &self.canvas_id,
                &[SessionStatus::Running],
                SessionStatus::Paused,
                now,
            )
            .await
        {
            Ok(session) => {
                tracing::info!("Canvas '{}' paused by '{}'", self.canvas_id, triggered_by);
                self.announce_paused(triggered_by, now).await?;
                Ok(session)
            }
            Err(StoreError::ConditionFailed) => {
                let current = self.current_session().await?;
                if current.status == SessionStatus::Paused {
                    tracing::debug!("Canvas '{}' is already paused", self.canvas_id);
                    self.announce_paused(triggered_by, now).await?;
                    Ok(current)
                } else {
                    Err(SessionGateError::InvalidTransition {
                        action: "pause",
                        current: current.status,
                    })
                }
            }
            Err(e) => Err(SessionGateError::Storage(e)),
        }
    }

    /// PAUSED / STOPPED → RUNNING
    ///
    /// すでに RUNNING の場合は状態を変えず、`session.resumed` だけを発行し直す。
    pub async fn resume(&self, triggered_by: &str) -> Result<GameSession, SessionGateError> {
        let now = self.clock.now();
        match self
            .repository
            .transition_status(
                &self.canvas_id,
                &[SessionStatus::Paused, SessionStatus::Stopped],
                SessionStatus::Running,
                now,
            )
            .await
        {
            Ok(session) => {
                tracing::info!("Canvas '{}' resumed by '{}'", self.canvas_id, triggered_by);
                self.announce_resumed(triggered_by, now).await?;
                Ok(session)
            }
            Err(StoreError::ConditionFailed) => {
                // 遷移元に含まれないのは RUNNING だけ
                let current = self.current_session().await?;
                tracing::debug!("Canvas '{}' is already running", self.canvas_id);
                self.announce_resumed(triggered_by, now).await?;
                Ok(current)
            }
            Err(e) => Err(SessionGateError::Storage(e)),
        }
    }

    async fn announce_paused(
        &self,
        triggered_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SessionGateError> {
        self.publish(CanvasEvent::SessionPaused {
            canvas_id: self.canvas_id.clone(),
            triggered_by: triggered_by.to_string(),
            timestamp: now,
        })
        .await
    }

    async fn announce_resumed(
        &self,
        triggered_by: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SessionGateError> {
        self.publish(CanvasEvent::SessionResumed {
            canvas_id: self.canvas_id.clone(),
            triggered_by: triggered_by.to_string(),
            timestamp: now,
        })
        .await
    }

    async fn publish(&self, event: CanvasEvent) -> Result<(), SessionGateError> {
        self.publisher.publish(&event).await.map_err(|e| {
            tracing::error!("Failed to publish {}: {}", event.event_type(), e);
            SessionGateError::Transport(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{TransportError, gateway::MockEventPublisher},
        infrastructure::repository::InMemoryGameSessionRepository,
    };
    use chrono::TimeZone;
    use pixelwar_shared::time::FixedClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn create_usecase(
        repository: Arc<InMemoryGameSessionRepository>,
        publisher: MockEventPublisher,
    ) -> SessionGateUseCase {
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap(),
        ));
        SessionGateUseCase::new(
            repository,
            Arc::new(publisher),
            clock,
            CanvasId::new("main".to_string()).unwrap(),
        )
    }

    fn expect_events(publisher: &mut MockEventPublisher, event_type: &'static str, times: usize) {
        publisher
            .expect_publish()
            .withf(move |event| event.event_type() == event_type)
            .times(times)
            .returning(|_| Ok(()));
    }

    #[tokio::test]
    async fn test_resume_opens_a_fresh_canvas() {
        // テスト項目: STOPPED（行なし）から resume で RUNNING になり、session.resumed が発行される
        // given (前提条件):
        let repository = Arc::new(InMemoryGameSessionRepository::new());
        let mut publisher = MockEventPublisher::new();
        expect_events(&mut publisher, "session.resumed", 1);
        let usecase = create_usecase(repository, publisher);

        // when (操作):
        let session = usecase.resume("admin").await.unwrap();

        // then (期待する結果):
        assert_eq!(session.status, SessionStatus::Running);
        assert_eq!(session.paused_at, None);
    }

    #[tokio::test]
    async fn test_pause_then_resume() {
        // テスト項目: RUNNING → PAUSED → RUNNING と遷移し、それぞれイベントが発行される
        // given (前提条件):
        let repository = Arc::new(InMemoryGameSessionRepository::new());
        let mut publisher = MockEventPublisher::new();
        expect_events(&mut publisher, "session.resumed", 2);
        expect_events(&mut publisher, "session.paused", 1);
        let usecase = create_usecase(repository, publisher);
        usecase.resume("admin").await.unwrap();

        // when (操作):
        let paused = usecase.pause("admin").await.unwrap();
        let resumed = usecase.resume("admin").await.unwrap();

        // then (期待する結果):
        assert_eq!(paused.status, SessionStatus::Paused);
        assert!(paused.paused_at.is_some());
        assert_eq!(resumed.status, SessionStatus::Running);
        assert_eq!(resumed.paused_at, None);
    }

    #[tokio::test]
    async fn test_pause_is_idempotent() {
        // テスト項目: PAUSED のときの pause は状態を変えず、session.paused を発行し直す
        // given (前提条件):
        let repository = Arc::new(InMemoryGameSessionRepository::new());
        let mut publisher = MockEventPublisher::new();
        expect_events(&mut publisher, "session.resumed", 1);
        expect_events(&mut publisher, "session.paused", 2);
        let usecase = create_usecase(repository, publisher);
        usecase.resume("admin").await.unwrap();
        usecase.pause("admin").await.unwrap();

        // when (操作):
        let result = usecase.pause("admin").await;

        // then (期待する結果):
        assert_eq!(result.unwrap().status, SessionStatus::Paused);
    }

    #[tokio::test]
    async fn test_pause_on_stopped_is_rejected() {
        // テスト項目: STOPPED のときの pause は InvalidTransition になり、STOPPED のまま
        // given (前提条件):
        let repository = Arc::new(InMemoryGameSessionRepository::new());
        let publisher = MockEventPublisher::new();
        let usecase = create_usecase(repository.clone(), publisher);

        // when (操作):
        let result = usecase.pause("admin").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SessionGateError::InvalidTransition {
                action: "pause",
                current: SessionStatus::Stopped,
            })
        );
        assert_eq!(
            usecase.current_session().await.unwrap().status,
            SessionStatus::Stopped
        );
    }

    #[tokio::test]
    async fn test_resume_on_running_is_idempotent() {
        // テスト項目: RUNNING のときの resume は成功し、session.resumed を発行し直す
        // given (前提条件):
        let repository = Arc::new(InMemoryGameSessionRepository::new());
        let mut publisher = MockEventPublisher::new();
        expect_events(&mut publisher, "session.resumed", 2);
        let usecase = create_usecase(repository, publisher);
        usecase.resume("admin").await.unwrap();

        // when (操作):
        let result = usecase.resume("admin").await;

        // then (期待する結果):
        assert_eq!(result.unwrap().status, SessionStatus::Running);
    }

    #[tokio::test]
    async fn test_retried_pause_announces_after_publish_failure() {
        // テスト項目: 遷移後に発行が失敗した pause を再試行すると、session.paused が届く
        // given (前提条件):
        let repository = Arc::new(InMemoryGameSessionRepository::new());
        let mut publisher = MockEventPublisher::new();
        expect_events(&mut publisher, "session.resumed", 1);
        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();
        publisher
            .expect_publish()
            .withf(|event| event.event_type() == "session.paused")
            .times(2)
            .returning(move |_| {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(TransportError::Unavailable("topic down".to_string()))
                } else {
                    Ok(())
                }
            });
        let usecase = create_usecase(repository, publisher);
        usecase.resume("admin").await.unwrap();
        let first = usecase.pause("admin").await;

        // when (操作):
        let retried = usecase.pause("admin").await;

        // then (期待する結果):
        assert!(matches!(first, Err(SessionGateError::Transport(_))));
        assert_eq!(retried.unwrap().status, SessionStatus::Paused);
        assert_eq!(failures.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_publish_failure_propagates() {
        // テスト項目: イベント発行の失敗はエラーとして返される
        // given (前提条件):
        let repository = Arc::new(InMemoryGameSessionRepository::new());
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .returning(|_| Err(TransportError::Unavailable("topic down".to_string())));
        let usecase = create_usecase(repository, publisher);

        // when (操作):
        let result = usecase.resume("admin").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(SessionGateError::Transport(TransportError::Unavailable(
                "topic down".to_string()
            )))
        );
    }
}
