//! UseCase: Topic イベントをすべてのライブ接続に配信する
//!
//! - 接続ごとの配信は並行に行い、1 つの接続の中ではイベントの順序を保つ
//! - 接続先がもう存在しない場合は登録を削除して次の接続に進む
//! - それ以外の失敗はログに残して次の接続に進む

use std::sync::Arc;

use futures_util::future::join_all;

use crate::domain::{Connection, MessagePusher, PushError};

use super::{connection_registry::ConnectionRegistry, error::RegistryError};

/// 配信結果の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    /// すべてのイベントを届けられた接続数
    pub delivered: usize,
    /// 接続先がなく削除した接続数
    pub pruned: usize,
    /// 一時的な失敗で配信を打ち切った接続数
    pub failed: usize,
}

enum ConnectionDelivery {
    Delivered,
    Pruned,
    Failed,
}

/// ファンアウトのユースケース
pub struct BroadcastFanout {
    registry: Arc<ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl BroadcastFanout {
    pub fn new(registry: Arc<ConnectionRegistry>, message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self {
            registry,
            message_pusher,
        }
    }

    /// イベント（Topic から受け取った生の JSON）をすべての接続に配信する
    pub async fn deliver(&self, events: &[String]) -> Result<FanoutReport, RegistryError> {
        let mut report = FanoutReport::default();
        if events.is_empty() {
            return Ok(report);
        }

        let mut start = None;
        loop {
            let page = self.registry.list_page(start).await?;
            let deliveries = page
                .items
                .iter()
                .map(|connection| self.deliver_to(connection, events));
            for result in join_all(deliveries).await {
                match result {
                    ConnectionDelivery::Delivered => report.delivered += 1,
                    ConnectionDelivery::Pruned => report.pruned += 1,
                    ConnectionDelivery::Failed => report.failed += 1,
                }
            }
            match page.next {
                Some(next) => start = Some(next),
                None => break,
            }
        }

        tracing::debug!(
            "Fan-out of {} event(s): delivered={} pruned={} failed={}",
            events.len(),
            report.delivered,
            report.pruned,
            report.failed
        );
        Ok(report)
    }

    async fn deliver_to(&self, connection: &Connection, events: &[String]) -> ConnectionDelivery {
        for event in events {
            match self
                .message_pusher
                .push_to(&connection.connection_id, event)
                .await
            {
                Ok(()) => {}
                Err(PushError::Gone(_)) => {
                    tracing::info!(
                        "Connection '{}' is gone, removing it",
                        connection.connection_id
                    );
                    self.message_pusher
                        .unregister_channel(&connection.connection_id)
                        .await;
                    if let Err(e) = self.registry.unregister(&connection.connection_id).await {
                        tracing::warn!(
                            "Failed to remove stale connection '{}': {}",
                            connection.connection_id,
                            e
                        );
                    }
                    return ConnectionDelivery::Pruned;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to push to connection '{}': {}",
                        connection.connection_id,
                        e
                    );
                    return ConnectionDelivery::Failed;
                }
            }
        }
        ConnectionDelivery::Delivered
    }
}
