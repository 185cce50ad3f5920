//! Queue メッセージと Topic イベントの定義
//!
//! ワイヤ形式はすべて camelCase の JSON。Topic イベントは `type` フィールドで
//! タグ付けされた列挙型で、未知の `type` は明示的に拒否する。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    error::EventParseError,
    value_object::{CanvasId, Color, UserId},
};

/// 描画キューに積まれるメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawMessage {
    pub x: u32,
    pub y: u32,
    pub color: Color,
    pub user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub canvas_id: CanvasId,
    pub timestamp: DateTime<Utc>,
    /// 同期パスでレート制限を通過済みか。false の場合はワーカーが再度チェックする
    #[serde(default)]
    pub rate_limit_checked: bool,
}

impl DrawMessage {
    /// 表示用のユーザー名（未指定ならユーザー ID）
    pub fn author_name(&self) -> String {
        match self.username.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.user_id.as_str().to_string(),
        }
    }
}

/// スナップショットキューに積まれるメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRequest {
    pub request_id: Uuid,
    pub requested_by: String,
    pub requested_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

/// Topic に流れるイベント
///
/// ライブ接続には、このイベントの JSON がそのまま配信される。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CanvasEvent {
    #[serde(rename = "pixel.drawn", rename_all = "camelCase")]
    PixelDrawn {
        canvas_id: CanvasId,
        x: u32,
        y: u32,
        color: Color,
        user_id: UserId,
        username: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "session.paused", rename_all = "camelCase")]
    SessionPaused {
        canvas_id: CanvasId,
        triggered_by: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "session.resumed", rename_all = "camelCase")]
    SessionResumed {
        canvas_id: CanvasId,
        triggered_by: String,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename = "snapshot.ready", rename_all = "camelCase")]
    SnapshotReady {
        snapshot_id: String,
        url: String,
        requested_by: String,
        created_at: DateTime<Utc>,
    },
}

const KNOWN_EVENT_TYPES: [&str; 4] = [
    "pixel.drawn",
    "session.paused",
    "session.resumed",
    "snapshot.ready",
];

impl CanvasEvent {
    /// ワイヤ上の `type` の値
    pub fn event_type(&self) -> &'static str {
        match self {
            CanvasEvent::PixelDrawn { .. } => "pixel.drawn",
            CanvasEvent::SessionPaused { .. } => "session.paused",
            CanvasEvent::SessionResumed { .. } => "session.resumed",
            CanvasEvent::SnapshotReady { .. } => "snapshot.ready",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Topic から受け取った生の JSON をパースする
    ///
    /// `type` が既知の値でない場合は `UnknownType` を返し、別の形にフォールバックしない。
    pub fn parse(raw: &str) -> Result<Self, EventParseError> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| EventParseError::Malformed(e.to_string()))?;

        let event_type = value
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(EventParseError::MissingType)?;
        if !KNOWN_EVENT_TYPES.contains(&event_type) {
            return Err(EventParseError::UnknownType(event_type.to_string()));
        }

        serde_json::from_value(value).map_err(|e| EventParseError::Malformed(e.to_string()))
    }
}
