//! UseCase: ユーザー単位・固定時間窓のレート制限
//!
//! ストアの条件付き加算 1 回だけで判定する。読み取ってから書き込む 2 段階の更新はしない。

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use pixelwar_shared::time::truncate_to_window;

use crate::domain::{RateLimitRepository, StoreError, UserId};

/// バケット文字列の書式（窓の開始時刻）
const BUCKET_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// レート制限
pub struct RateLimiter {
    repository: Arc<dyn RateLimitRepository>,
    max_pixels_per_window: u32,
    window_seconds: u32,
}

impl RateLimiter {
    pub fn new(
        repository: Arc<dyn RateLimitRepository>,
        max_pixels_per_window: u32,
        window_seconds: u32,
    ) -> Self {
        Self {
            repository,
            max_pixels_per_window,
            window_seconds: window_seconds.max(1),
        }
    }

    /// `now` が属する時間窓のバケット
    pub fn bucket_for(&self, now: DateTime<Utc>) -> String {
        truncate_to_window(now, self.window_seconds)
            .format(BUCKET_FORMAT)
            .to_string()
    }

    /// 1 回分の書き込み枠を消費する
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - 許可
    /// * `Ok(false)` - 上限に達している
    /// * `Err(StoreError)` - ストア障害（許可しない）
    pub async fn try_consume(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let bucket = self.bucket_for(now);
        let expires_at = now + Duration::seconds(2 * i64::from(self.window_seconds));

        match self
            .repository
            .increment_if_below(user_id, &bucket, self.max_pixels_per_window, expires_at)
            .await
        {
            Ok(count) => {
                tracing::debug!("User '{}' bucket {} count={}", user_id, bucket, count);
                Ok(true)
            }
            Err(StoreError::ConditionFailed) => {
                tracing::debug!("User '{}' hit the rate limit in bucket {}", user_id, bucket);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}
