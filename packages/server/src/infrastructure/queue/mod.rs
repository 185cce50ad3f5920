//! Queue の実装と、キューを消費するハンドラの trait
//!
//! ## 実装
//!
//! - `inmemory`: tokio の mpsc チャンネルを使った、再配信付きのプロセス内キュー

pub mod inmemory;

use async_trait::async_trait;
use thiserror::Error;

pub use inmemory::{InMemoryQueue, QueueReceiver};

/// メッセージ処理の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsumeError {
    /// 何度配信しても処理できないメッセージ（再配信せずデッドレターへ）
    #[error("malformed message: {0}")]
    Malformed(String),
    /// インフラ障害など。キューの再配信に任せる
    #[error("retryable failure: {0}")]
    Retryable(String),
}

/// キューから取り出したメッセージを 1 件処理する
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, body: &str) -> Result<(), ConsumeError>;
}
