//! UseCase: 描画キューのワーカー
//!
//! メッセージは少なくとも 1 回配信されるため、同じメッセージを何度処理しても
//! 最終的なピクセルは同じになる（重複するのは `pixel.drawn` イベントだけ）。

use std::sync::Arc;

use pixelwar_shared::time::Clock;

use crate::domain::{
    CanvasEvent, DrawMessage, EventPublisher, GameSessionRepository, Pixel, PixelRepository,
};

use super::{error::DrawWorkerError, rate_limiter::RateLimiter};

/// 1 メッセージの処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// ピクセルを保存し、イベントを発行した
    Persisted,
    /// レート制限によりポリシーとして破棄した（エラーではない）
    Dropped,
}

/// 描画ワーカーのユースケース
pub struct ProcessDrawUseCase {
    pixel_repository: Arc<dyn PixelRepository>,
    session_repository: Arc<dyn GameSessionRepository>,
    publisher: Arc<dyn EventPublisher>,
    rate_limiter: Arc<RateLimiter>,
    clock: Arc<dyn Clock>,
}

impl ProcessDrawUseCase {
    pub fn new(
        pixel_repository: Arc<dyn PixelRepository>,
        session_repository: Arc<dyn GameSessionRepository>,
        publisher: Arc<dyn EventPublisher>,
        rate_limiter: Arc<RateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            pixel_repository,
            session_repository,
            publisher,
            rate_limiter,
            clock,
        }
    }

    /// 描画メッセージを 1 件処理する
    ///
    /// `Err` を返した場合、キューが再配信する。
    pub async fn execute(&self, message: DrawMessage) -> Result<DrawOutcome, DrawWorkerError> {
        // 1. 同期パスでレート制限を通っていなければ、ここで消費する
        if !message.rate_limit_checked {
            let allowed = self
                .rate_limiter
                .try_consume(&message.user_id, self.clock.now())
                .await
                .map_err(DrawWorkerError::Storage)?;
            if !allowed {
                tracing::warn!(
                    "Dropping draw ({}, {}) from '{}': rate limit exceeded",
                    message.x,
                    message.y,
                    message.user_id
                );
                return Ok(DrawOutcome::Dropped);
            }
        }

        // 2. ピクセルを上書き保存
        let username = message.author_name();
        let pixel = Pixel {
            canvas_id: message.canvas_id.clone(),
            x: message.x,
            y: message.y,
            color: message.color.clone(),
            user_id: message.user_id.clone(),
            username: username.clone(),
            last_updated: message.timestamp,
        };
        self.pixel_repository.put_pixel(pixel).await.map_err(|e| {
            tracing::error!("Failed to store pixel ({}, {}): {}", message.x, message.y, e);
            DrawWorkerError::Storage(e)
        })?;

        // 3. pixel.drawn を発行
        let event = CanvasEvent::PixelDrawn {
            canvas_id: message.canvas_id.clone(),
            x: message.x,
            y: message.y,
            color: message.color,
            user_id: message.user_id,
            username,
            timestamp: message.timestamp,
        };
        self.publisher.publish(&event).await.map_err(|e| {
            tracing::error!("Failed to publish pixel.drawn: {}", e);
            DrawWorkerError::Publish(e)
        })?;

        // 4. 描画数の加算はベストエフォート
        if let Err(e) = self
            .session_repository
            .increment_pixel_count(&message.canvas_id)
            .await
        {
            tracing::warn!(
                "Failed to increment pixel count for '{}': {}",
                message.canvas_id,
                e
            );
        }

        tracing::debug!("Pixel ({}, {}) persisted", message.x, message.y);
        Ok(DrawOutcome::Persisted)
    }
}
