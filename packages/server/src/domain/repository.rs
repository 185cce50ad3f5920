//! Repository trait 定義
//!
//! ドメイン層が必要とする KeyValueStore へのインターフェースを、テーブルごとに定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! ## 並行性のルール
//!
//! - 分散ロックは使わない。カウンタの更新は必ず単一行の条件付き更新で行う
//! - 読み取り→書き込みの 2 段階でカウンタを更新してはならない
//! - それ以外の書き込みは全行上書き（冪等）か単調増加のみ

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    entity::{Connection, GameSession, Pixel, SessionStatus, SnapshotRecord},
    error::StoreError,
    value_object::{CanvasId, ClientId, ConnectionId, UserId},
};

/// ページ単位のスキャン結果
///
/// `next` が `Some` の間は続きが存在する。呼び出し側は `None` になるまでループすること。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next: Option<String>,
}

/// Pixel テーブル
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PixelRepository: Send + Sync {
    /// ピクセルを全行上書きで保存
    async fn put_pixel(&self, pixel: Pixel) -> Result<(), StoreError>;

    async fn get_pixel(
        &self,
        canvas_id: &CanvasId,
        x: u32,
        y: u32,
    ) -> Result<Option<Pixel>, StoreError>;

    /// キャンバスのピクセルを 1 ページ分スキャン
    async fn scan_pixels(
        &self,
        canvas_id: &CanvasId,
        start: Option<String>,
    ) -> Result<Page<Pixel>, StoreError>;
}

/// RateLimitBucket テーブル
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateLimitRepository: Send + Sync {
    /// `count` が存在しないか `max` 未満のときだけ 1 加算する（アトミック）
    ///
    /// # Returns
    ///
    /// * `Ok(u32)` - 加算後の count
    /// * `Err(StoreError::ConditionFailed)` - 上限に達している
    async fn increment_if_below(
        &self,
        user_id: &UserId,
        bucket: &str,
        max: u32,
        expires_at: DateTime<Utc>,
    ) -> Result<u32, StoreError>;
}

/// GameSession テーブル
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GameSessionRepository: Send + Sync {
    /// セッションを取得（行が存在しなければ `None`）
    async fn get_session(&self, canvas_id: &CanvasId) -> Result<Option<GameSession>, StoreError>;

    /// 現在の状態が `from` のいずれかのときだけ `to` に遷移する（アトミック）
    ///
    /// 行が存在しない場合は `STOPPED` とみなす。`to` が `PAUSED` のとき `paused_at` を設定し、
    /// それ以外では消去する。
    async fn transition_status(
        &self,
        canvas_id: &CanvasId,
        from: &[SessionStatus],
        to: SessionStatus,
        at: DateTime<Utc>,
    ) -> Result<GameSession, StoreError>;

    /// `pixel_count` を 1 加算し、加算後の値を返す
    async fn increment_pixel_count(&self, canvas_id: &CanvasId) -> Result<u64, StoreError>;
}

/// Connection テーブル
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    async fn put_connection(&self, connection: Connection) -> Result<(), StoreError>;

    /// 接続を削除（存在しなくても成功）
    async fn delete_connection(&self, connection_id: &ConnectionId) -> Result<(), StoreError>;

    async fn find_by_client_id(&self, client_id: &ClientId) -> Result<Vec<Connection>, StoreError>;

    async fn find_by_session_id(&self, session_id: &str) -> Result<Vec<Connection>, StoreError>;

    /// 接続を 1 ページ分スキャン
    async fn scan_connections(
        &self,
        start: Option<String>,
        limit: usize,
    ) -> Result<Page<Connection>, StoreError>;
}

/// SnapshotRecord テーブル
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    async fn put_snapshot(&self, record: SnapshotRecord) -> Result<(), StoreError>;

    /// 新しい順に最大 `limit` 件
    async fn list_snapshots(
        &self,
        canvas_id: &CanvasId,
        limit: usize,
    ) -> Result<Vec<SnapshotRecord>, StoreError>;
}
