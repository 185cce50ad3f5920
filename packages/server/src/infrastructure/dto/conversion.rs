//! Conversion logic between domain entities and DTOs.

use pixelwar_shared::time::to_rfc3339_millis;

use crate::domain::{Pixel, SnapshotRecord};
use crate::infrastructure::dto::http as dto;

impl From<Pixel> for dto::PixelDto {
    fn from(model: Pixel) -> Self {
        Self {
            x: model.x,
            y: model.y,
            color: model.color.into_string(),
            user: model.user_id.into_string(),
            username: model.username,
            timestamp: to_rfc3339_millis(model.last_updated),
        }
    }
}

impl From<SnapshotRecord> for dto::SnapshotDto {
    fn from(model: SnapshotRecord) -> Self {
        Self {
            id: model.snapshot_id,
            url: model.url,
            created_at: to_rfc3339_millis(model.created_at),
            triggered_by: model.triggered_by,
        }
    }
}
