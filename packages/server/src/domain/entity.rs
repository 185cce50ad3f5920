//! Entity 定義
//!
//! KeyValueStore に保存される各行と、ゲームセッションの状態遷移ルールを定義します。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::value_object::{CanvasId, ClientId, Color, ConnectionId, UserId};

/// キャンバス上の 1 ピクセル
///
/// キーは `(canvas_id, x, y)`。同じ座標への書き込みは上書きされ、履歴は残らない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pixel {
    pub canvas_id: CanvasId,
    pub x: u32,
    pub y: u32,
    pub color: Color,
    pub user_id: UserId,
    pub username: String,
    pub last_updated: DateTime<Utc>,
}

/// ゲームセッションの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Running,
    Paused,
    Stopped,
}

impl SessionStatus {
    /// 描画を受け付けられる状態か
    pub fn can_accept(self) -> bool {
        self == SessionStatus::Running
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Running => "RUNNING",
            SessionStatus::Paused => "PAUSED",
            SessionStatus::Stopped => "STOPPED",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// キャンバスごとのシングルトンなゲームセッション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSession {
    pub canvas_id: CanvasId,
    pub status: SessionStatus,
    pub paused_at: Option<DateTime<Utc>>,
    pub pixel_count: u64,
}

impl GameSession {
    /// 行が存在しないキャンバスの初期状態
    pub fn stopped(canvas_id: CanvasId) -> Self {
        Self {
            canvas_id,
            status: SessionStatus::Stopped,
            paused_at: None,
            pixel_count: 0,
        }
    }
}

/// ユーザー単位・時間窓単位のレート制限カウンタ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitBucket {
    pub user_id: UserId,
    /// 時間窓の識別子（窓の開始時刻の文字列）
    pub bucket: String,
    pub count: u32,
    /// この時刻を過ぎた行はストアから消える
    pub expires_at: DateTime<Utc>,
}

/// 解決済みのユーザー識別情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    /// セッション経由で解決された場合のセッション ID
    pub session_id: Option<String>,
}

/// プッシュ可能なライブ接続
///
/// `client_id` ごとに生存している行は高々 1 つ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub connection_id: ConnectionId,
    pub client_id: ClientId,
    pub session_id: Option<String>,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub connected_at: DateTime<Utc>,
}

/// 完了したスナップショットのメタデータ（不変）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub snapshot_id: String,
    pub canvas_id: CanvasId,
    pub object_key: String,
    pub url: String,
    pub triggered_by: String,
    pub created_at: DateTime<Utc>,
}
