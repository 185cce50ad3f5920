//! InMemory RateLimit Repository 実装
//!
//! 条件付き加算は 1 つのロック区間で「期限切れ行の破棄 → 条件判定 → 加算」を行うため、
//! 単一行の条件付き更新としてアトミックに振る舞います。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pixelwar_shared::time::Clock;
use tokio::sync::Mutex;

use crate::domain::{RateLimitBucket, RateLimitRepository, StoreError, UserId};

/// インメモリ RateLimit Repository 実装
pub struct InMemoryRateLimitRepository {
    /// Key: (user_id, bucket)
    buckets: Mutex<HashMap<(String, String), RateLimitBucket>>,
    /// TTL 判定に使う時計
    clock: Arc<dyn Clock>,
}

impl InMemoryRateLimitRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// 現在保持している（期限切れでない）バケット数
    pub async fn live_bucket_count(&self) -> usize {
        let now = self.clock.now();
        let buckets = self.buckets.lock().await;
        buckets.values().filter(|b| b.expires_at > now).count()
    }
}

#[async_trait]
impl RateLimitRepository for InMemoryRateLimitRepository {
    async fn increment_if_below(
        &self,
        user_id: &UserId,
        bucket: &str,
        max: u32,
        expires_at: DateTime<Utc>,
    ) -> Result<u32, StoreError> {
        let now = self.clock.now();
        let mut buckets = self.buckets.lock().await;
        buckets.retain(|_, b| b.expires_at > now);

        let key = (user_id.as_str().to_string(), bucket.to_string());
        let current = buckets.get(&key).map(|b| b.count).unwrap_or(0);
        if current >= max {
            return Err(StoreError::ConditionFailed);
        }

        let entry = buckets.entry(key).or_insert_with(|| RateLimitBucket {
            user_id: user_id.clone(),
            bucket: bucket.to_string(),
            count: 0,
            expires_at,
        });
        entry.count += 1;
        entry.expires_at = expires_at;
        Ok(entry.count)
    }
}
