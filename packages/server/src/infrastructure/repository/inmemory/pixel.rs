//! InMemory Pixel Repository 実装
//!
//! `BTreeMap` を `(canvas_id, x, y)` 順のテーブルとして使い、
//! スキャンは継続トークン `"{x}#{y}"` によるページングで返します。

use std::{collections::BTreeMap, ops::Bound};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{CanvasId, Page, Pixel, PixelRepository, StoreError};

/// 1 ページあたりのデフォルト件数
pub const DEFAULT_PIXEL_PAGE_SIZE: usize = 1000;

type PixelKey = (String, u32, u32);

/// インメモリ Pixel Repository 実装
pub struct InMemoryPixelRepository {
    pixels: Mutex<BTreeMap<PixelKey, Pixel>>,
    page_size: usize,
}

impl InMemoryPixelRepository {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PIXEL_PAGE_SIZE)
    }

    /// ページサイズを指定して作成（0 は 1 として扱う）
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            pixels: Mutex::new(BTreeMap::new()),
            page_size: page_size.max(1),
        }
    }
}

impl Default for InMemoryPixelRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_token(token: &str) -> Result<(u32, u32), StoreError> {
    let invalid = || StoreError::InvalidToken(token.to_string());
    let (x, y) = token.split_once('#').ok_or_else(invalid)?;
    Ok((
        x.parse().map_err(|_| invalid())?,
        y.parse().map_err(|_| invalid())?,
    ))
}

#[async_trait]
impl PixelRepository for InMemoryPixelRepository {
    async fn put_pixel(&self, pixel: Pixel) -> Result<(), StoreError> {
        let key = (pixel.canvas_id.as_str().to_string(), pixel.x, pixel.y);
        let mut pixels = self.pixels.lock().await;
        pixels.insert(key, pixel);
        Ok(())
    }

    async fn get_pixel(
        &self,
        canvas_id: &CanvasId,
        x: u32,
        y: u32,
    ) -> Result<Option<Pixel>, StoreError> {
        let pixels = self.pixels.lock().await;
        Ok(pixels
            .get(&(canvas_id.as_str().to_string(), x, y))
            .cloned())
    }

    async fn scan_pixels(
        &self,
        canvas_id: &CanvasId,
        start: Option<String>,
    ) -> Result<Page<Pixel>, StoreError> {
        let canvas = canvas_id.as_str().to_string();
        let lower = match start.as_deref() {
            Some(token) => {
                let (x, y) = parse_token(token)?;
                Bound::Excluded((canvas.clone(), x, y))
            }
            None => Bound::Included((canvas.clone(), 0, 0)),
        };

        let pixels = self.pixels.lock().await;
        let mut range = pixels
            .range((lower, Bound::Unbounded))
            .take_while(|((c, _, _), _)| *c == canvas)
            .peekable();

        let mut items = Vec::with_capacity(self.page_size);
        while items.len() < self.page_size {
            match range.next() {
                Some((_, pixel)) => items.push(pixel.clone()),
                None => break,
            }
        }

        let next = match (range.peek(), items.last()) {
            (Some(_), Some(last)) => Some(format!("{}#{}", last.x, last.y)),
            _ => None,
        };
        Ok(Page { items, next })
    }
}
