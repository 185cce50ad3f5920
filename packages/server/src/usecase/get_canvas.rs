//! UseCase: キャンバス上の全ピクセルを取得

use std::sync::Arc;

use crate::domain::{CanvasId, Pixel, PixelRepository, StoreError};

/// キャンバス取得のユースケース
pub struct GetCanvasUseCase {
    repository: Arc<dyn PixelRepository>,
    canvas_id: CanvasId,
}

impl GetCanvasUseCase {
    pub fn new(repository: Arc<dyn PixelRepository>, canvas_id: CanvasId) -> Self {
        Self {
            repository,
            canvas_id,
        }
    }

    pub fn canvas_id(&self) -> &CanvasId {
        &self.canvas_id
    }

    /// すべてのピクセル（ページを最後まで辿る）
    pub async fn execute(&self) -> Result<Vec<Pixel>, StoreError> {
        let mut pixels = Vec::new();
        let mut start = None;
        loop {
            let page = self.repository.scan_pixels(&self.canvas_id, start).await?;
            pixels.extend(page.items);
            match page.next {
                Some(next) => start = Some(next),
                None => break,
            }
        }
        Ok(pixels)
    }
}
