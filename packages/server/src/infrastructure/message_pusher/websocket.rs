//! WebSocket を使った MessagePusher 実装
//!
//! ## 責務
//!
//! - 接続ごとの WebSocket 送信チャンネル（`UnboundedSender`）を管理
//! - 接続へのメッセージ送信（push_to）
//!
//! ## 設計ノート
//!
//! WebSocket の生成は UI 層（`ui/handler/websocket.rs`）で行われます。
//! この実装は生成された `UnboundedSender` を受け取り、メッセージ送信に使用します。
//! チャンネルが登録されていない、または受信側が閉じている場合は接続が消えたとみなし
//! `PushError::Gone` を返します。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::{ConnectionId, MessagePusher, PushError, PusherChannel};

/// WebSocket を使った MessagePusher 実装
#[derive(Default)]
pub struct WebSocketMessagePusher {
    /// Key: connection_id
    channels: RwLock<HashMap<String, PusherChannel>>,
}

impl WebSocketMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登録中のチャンネル数
    pub async fn channel_count(&self) -> usize {
        self.channels.read().await.len()
    }
}

#[async_trait]
impl MessagePusher for WebSocketMessagePusher {
    async fn register_channel(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut channels = self.channels.write().await;
        tracing::debug!("Connection '{}' registered to MessagePusher", connection_id);
        channels.insert(connection_id.into_string(), sender);
    }

    async fn unregister_channel(&self, connection_id: &ConnectionId) {
        let mut channels = self.channels.write().await;
        channels.remove(connection_id.as_str());
        tracing::debug!("Connection '{}' unregistered from MessagePusher", connection_id);
    }

    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), PushError> {
        let channels = self.channels.read().await;
        let Some(sender) = channels.get(connection_id.as_str()) else {
            return Err(PushError::Gone(connection_id.as_str().to_string()));
        };

        sender
            .send(content.to_string())
            .map_err(|_| PushError::Gone(connection_id.as_str().to_string()))?;
        tracing::trace!("Pushed message to connection '{}'", connection_id);
        Ok(())
    }
}
