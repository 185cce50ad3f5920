//! UseCase: 描画リクエストの受付（同期パス）
//!
//! 入力検証 → セッション状態の確認 → レート制限 → キューへの投入、の順に処理する。
//! どこかで拒否された場合、キューには何も積まれない。

use std::sync::Arc;

use pixelwar_shared::time::Clock;

use crate::domain::{
    CanvasId, Color, DrawMessage, GameSessionRepository, Identity, MessageQueue, SessionStatus,
};

use super::{
    error::{DrawRejection, SubmitError},
    rate_limiter::RateLimiter,
};

/// 盤面の大きさ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardBounds {
    pub width: u32,
    pub height: u32,
}

impl BoardBounds {
    pub fn contains(&self, x: i64, y: i64) -> bool {
        (0..i64::from(self.width)).contains(&x) && (0..i64::from(self.height)).contains(&y)
    }
}

/// 描画リクエスト
#[derive(Debug, Clone)]
pub struct DrawCommand {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub color: String,
    pub identity: Identity,
}

/// 描画受付のユースケース
pub struct SubmitPixelUseCase {
    session_repository: Arc<dyn GameSessionRepository>,
    rate_limiter: Arc<RateLimiter>,
    draw_queue: Arc<dyn MessageQueue>,
    clock: Arc<dyn Clock>,
    canvas_id: CanvasId,
    bounds: BoardBounds,
}

impl SubmitPixelUseCase {
    pub fn new(
        session_repository: Arc<dyn GameSessionRepository>,
        rate_limiter: Arc<RateLimiter>,
        draw_queue: Arc<dyn MessageQueue>,
        clock: Arc<dyn Clock>,
        canvas_id: CanvasId,
        bounds: BoardBounds,
    ) -> Self {
        Self {
            session_repository,
            rate_limiter,
            draw_queue,
            clock,
            canvas_id,
            bounds,
        }
    }

    /// 描画リクエストを受け付け、描画キューに積む
    ///
    /// # Returns
    ///
    /// * `Ok(DrawMessage)` - キューに積んだメッセージ
    /// * `Err(SubmitError::Rejected)` - 入力不正・セッション停止中・レート制限
    /// * `Err(SubmitError::Storage | Queue)` - インフラ障害
    pub async fn execute(&self, command: DrawCommand) -> Result<DrawMessage, SubmitError> {
        // 1. 入力検証
        let (x, y, color) = self.validate(&command)?;

        // 2. セッション状態
        let status = self
            .session_repository
            .get_session(&self.canvas_id)
            .await
            .map_err(SubmitError::Storage)?
            .map(|s| s.status)
            .unwrap_or(SessionStatus::Stopped);
        if !status.can_accept() {
            return Err(DrawRejection::SessionNotRunning(status).into());
        }

        // 3. レート制限
        let now = self.clock.now();
        let user_id = &command.identity.user_id;
        let allowed = self
            .rate_limiter
            .try_consume(user_id, now)
            .await
            .map_err(|e| {
                tracing::error!("Rate limit check failed for '{}': {}", user_id, e);
                SubmitError::Storage(e)
            })?;
        if !allowed {
            return Err(DrawRejection::RateLimited.into());
        }

        // 4. キューに投入
        let username = Some(command.identity.username.trim().to_string())
            .filter(|name| !name.is_empty());
        let message = DrawMessage {
            x,
            y,
            color,
            user_id: user_id.clone(),
            username,
            canvas_id: self.canvas_id.clone(),
            timestamp: now,
            rate_limit_checked: true,
        };
        let body = serde_json::to_string(&message).map_err(|e| SubmitError::Queue(e.into()))?;
        self.draw_queue.send(body).await.map_err(|e| {
            tracing::error!("Failed to enqueue draw from '{}': {}", user_id, e);
            SubmitError::Queue(e)
        })?;

        tracing::debug!(
            "Queued draw ({}, {}) {} from '{}'",
            message.x,
            message.y,
            message.color,
            message.user_id
        );
        Ok(message)
    }

    fn validate(&self, command: &DrawCommand) -> Result<(u32, u32, Color), DrawRejection> {
        let (Some(x), Some(y)) = (command.x, command.y) else {
            return Err(DrawRejection::InvalidInput(
                "x, y and color are required".to_string(),
            ));
        };
        let color = Color::new(command.color.clone()).map_err(|_| {
            DrawRejection::InvalidInput("x, y and color are required".to_string())
        })?;
        if !self.bounds.contains(x, y) {
            return Err(DrawRejection::InvalidInput(format!(
                "coordinates ({}, {}) are outside the {}x{} board",
                x, y, self.bounds.width, self.bounds.height
            )));
        }
        // 範囲チェック済みなので u32 に収まる
        let x = u32::try_from(x).map_err(|e| DrawRejection::InvalidInput(e.to_string()))?;
        let y = u32::try_from(y).map_err(|e| DrawRejection::InvalidInput(e.to_string()))?;
        Ok((x, y, color))
    }
}
