//! HTTP API request / response DTOs.

use serde::{Deserialize, Serialize};

/// `POST /api/draw` request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawRequestDto {
    pub x: Option<i64>,
    pub y: Option<i64>,
    #[serde(default)]
    pub color: String,
    /// Only honoured for trusted internal callers
    pub user_id: Option<String>,
    /// Only honoured for trusted internal callers
    pub username: Option<String>,
}

/// Body of admin requests (`pause`, `resume`, `snapshot`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRequestDto {
    /// Acting user for trusted internal callers
    pub user_id: Option<String>,
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessageDto {
    pub message: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotQueuedDto {
    pub message: String,
    pub status: String,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PixelDto {
    pub x: u32,
    pub y: u32,
    pub color: String,
    pub user: String,
    pub username: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasDto {
    pub canvas_id: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<PixelDto>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateDto {
    pub canvas_id: String,
    pub status: String,
    pub pixel_count: u64,
    pub active_connections: usize,
    pub last_snapshot_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDto {
    pub id: String,
    pub url: String,
    pub created_at: String,
    pub triggered_by: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotListDto {
    pub snapshots: Vec<SnapshotDto>,
}
