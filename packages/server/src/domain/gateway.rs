//! Store 以外の外部連携の trait 定義
//!
//! Queue（少なくとも 1 回配信）、Topic（pub/sub）、ObjectStore、ライブ接続へのプッシュ、
//! スナップショット完了のコールバック、ユーザー識別・管理者判定。

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{
    entity::{Identity, SnapshotRecord},
    error::{PushError, StoreError, TransportError},
    event::CanvasEvent,
    value_object::{ConnectionId, UserId},
};

/// ライブ接続へメッセージを届けるチャンネル
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// 永続キュー（少なくとも 1 回配信）
///
/// メッセージ本文は JSON 文字列。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, body: String) -> Result<(), TransportError>;
}

/// ファンアウト用 Topic への発行
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &CanvasEvent) -> Result<(), TransportError>;
}

/// 画像を保存する Blob ストア
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransportError>;

    /// キーに対応する公開 URL
    fn public_url(&self, key: &str) -> String;
}

/// ライブ接続へのプッシュ
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// 接続のチャンネルを登録
    async fn register_channel(&self, connection_id: ConnectionId, sender: PusherChannel);

    /// 接続のチャンネルを登録解除
    async fn unregister_channel(&self, connection_id: &ConnectionId);

    /// 接続にメッセージを送信
    ///
    /// 接続先がもう存在しない場合は `PushError::Gone` を返す。
    async fn push_to(&self, connection_id: &ConnectionId, content: &str) -> Result<(), PushError>;
}

/// スナップショット完了の通知先
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CallbackNotifier: Send + Sync {
    async fn notify_snapshot(
        &self,
        callback_url: &str,
        record: &SnapshotRecord,
    ) -> Result<(), TransportError>;
}

/// セッション ID からユーザーを解決する
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// 有効なセッションであればユーザー情報を返す（期限切れ・不明なら `None`）
    async fn resolve_session(&self, session_id: &str) -> Result<Option<Identity>, StoreError>;
}

/// 管理者判定
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn is_admin(&self, user_id: &UserId) -> bool;
}
