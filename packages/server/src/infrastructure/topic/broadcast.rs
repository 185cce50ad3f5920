//! tokio broadcast チャンネルを使った Topic 実装
//!
//! Topic にはイベントの JSON 文字列をそのまま流します。購読側（ファンアウト）は
//! 受け取った文字列を加工せずにライブ接続へ配信します。

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::{CanvasEvent, EventPublisher, TransportError};

/// 購読者が追いつけない場合に保持するイベント数
pub const DEFAULT_TOPIC_CAPACITY: usize = 4096;

/// プロセス内 Topic
#[derive(Clone)]
pub struct BroadcastTopic {
    sender: broadcast::Sender<String>,
}

impl BroadcastTopic {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Topic を購読する
    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }

    /// 生の JSON 文字列を発行する
    pub fn publish_raw(&self, raw: String) {
        // 購読者がいない場合の送信失敗は問題ない
        if self.sender.send(raw).is_err() {
            tracing::debug!("Topic has no subscribers, event dropped");
        }
    }
}

impl Default for BroadcastTopic {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_CAPACITY)
    }
}

#[async_trait]
impl EventPublisher for BroadcastTopic {
    async fn publish(&self, event: &CanvasEvent) -> Result<(), TransportError> {
        let raw = event.to_json()?;
        tracing::debug!("Publishing {} event", event.event_type());
        self.publish_raw(raw);
        Ok(())
    }
}
