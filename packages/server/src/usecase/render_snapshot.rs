//! UseCase: スナップショットワーカー
//!
//! 全ピクセルをページ単位でスキャンして PNG にエンコードし、ObjectStore に保存する。
//! ObjectStore への保存までの失敗はエラーとしてキューの再配信に任せ、
//! コールバックの失敗はログに残すだけにする。

use std::sync::Arc;

use pixelwar_shared::time::Clock;

use crate::domain::{
    CallbackNotifier, CanvasEvent, CanvasId, EventPublisher, ObjectStore, PixelMap,
    PixelRepository, SnapshotRecord, SnapshotRepository, SnapshotRequest, encode_png,
};

use super::{error::SnapshotError, submit_pixel::BoardBounds};

const PNG_CONTENT_TYPE: &str = "image/png";

/// スナップショット生成のユースケース
pub struct RenderSnapshotUseCase {
    pixel_repository: Arc<dyn PixelRepository>,
    snapshot_repository: Arc<dyn SnapshotRepository>,
    object_store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn CallbackNotifier>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    canvas_id: CanvasId,
    bounds: BoardBounds,
    background: String,
}

impl RenderSnapshotUseCase {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pixel_repository: Arc<dyn PixelRepository>,
        snapshot_repository: Arc<dyn SnapshotRepository>,
        object_store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn CallbackNotifier>,
        publisher: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
        canvas_id: CanvasId,
        bounds: BoardBounds,
        background: String,
    ) -> Self {
        Self {
            pixel_repository,
            snapshot_repository,
            object_store,
            notifier,
            publisher,
            clock,
            canvas_id,
            bounds,
            background,
        }
    }

    /// スナップショット要求を 1 件処理する
    pub async fn execute(
        &self,
        request: SnapshotRequest,
    ) -> Result<SnapshotRecord, SnapshotError> {
        // 1. 全ピクセルを読み込む（盤面外の座標は捨てる）
        let pixels = self.load_pixel_map().await?;
        tracing::debug!(
            "Rendering snapshot {} with {} pixel(s)",
            request.request_id,
            pixels.len()
        );

        // 2. エンコード
        let image = encode_png(
            self.bounds.width,
            self.bounds.height,
            &pixels,
            &self.background,
        )
        .map_err(|e| {
            tracing::error!("Failed to encode snapshot {}: {}", request.request_id, e);
            SnapshotError::Encode(e)
        })?;

        // 3. 要求時刻と要求 ID から決まるキーで保存（再配信では同じオブジェクトを上書きする）
        let created_at = self.clock.now();
        let object_key = format!(
            "snapshots/{}-{}-{}.png",
            self.canvas_id,
            request.requested_at.timestamp_millis(),
            request.request_id
        );
        self.object_store
            .put_object(&object_key, image, PNG_CONTENT_TYPE)
            .await
            .map_err(|e| {
                tracing::error!("Failed to store snapshot '{}': {}", object_key, e);
                SnapshotError::Transport(e)
            })?;
        let url = self.object_store.public_url(&object_key);

        // 4. メタデータを記録
        let record = SnapshotRecord {
            snapshot_id: request.request_id.to_string(),
            canvas_id: self.canvas_id.clone(),
            object_key,
            url,
            triggered_by: request.requested_by.clone(),
            created_at,
        };
        self.snapshot_repository
            .put_snapshot(record.clone())
            .await
            .map_err(SnapshotError::Storage)?;

        // 5. コールバックはベストエフォート
        if let Some(callback_url) = request.callback_url.as_deref() {
            if let Err(e) = self.notifier.notify_snapshot(callback_url, &record).await {
                tracing::warn!("Snapshot callback for {} failed: {}", record.snapshot_id, e);
            }
        }

        // 6. snapshot.ready を発行
        let event = CanvasEvent::SnapshotReady {
            snapshot_id: record.snapshot_id.clone(),
            url: record.url.clone(),
            requested_by: record.triggered_by.clone(),
            created_at,
        };
        self.publisher
            .publish(&event)
            .await
            .map_err(SnapshotError::Transport)?;

        tracing::info!("Snapshot {} stored at {}", record.snapshot_id, record.url);
        Ok(record)
    }

    async fn load_pixel_map(&self) -> Result<PixelMap, SnapshotError> {
        let mut pixels = PixelMap::new();
        let mut start = None;
        loop {
            let page = self
                .pixel_repository
                .scan_pixels(&self.canvas_id, start)
                .await
                .map_err(SnapshotError::Storage)?;
            for pixel in page.items {
                if pixel.x < self.bounds.width && pixel.y < self.bounds.height {
                    pixels.insert((pixel.x, pixel.y), pixel.color.into_string());
                }
            }
            match page.next {
                Some(next) => start = Some(next),
                None => break,
            }
        }
        Ok(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            Color, Pixel, TransportError, UserId,
            gateway::{MockCallbackNotifier, MockEventPublisher, MockObjectStore},
        },
        infrastructure::{
            object_store::InMemoryObjectStore,
            repository::{InMemoryPixelRepository, InMemorySnapshotRepository},
        },
    };
    use chrono::{DateTime, TimeZone, Utc};
    use flate2::read::ZlibDecoder;
    use pixelwar_shared::time::FixedClock;
    use std::{
        io::Read,
        sync::atomic::{AtomicUsize, Ordering},
    };
    use uuid::Uuid;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    fn main_canvas() -> CanvasId {
        CanvasId::new("main".to_string()).unwrap()
    }

    fn request(callback_url: Option<&str>) -> SnapshotRequest {
        SnapshotRequest {
            request_id: Uuid::nil(),
            requested_by: "admin".to_string(),
            requested_at: fixed_time(),
            callback_url: callback_url.map(str::to_string),
        }
    }

    fn pixel(x: u32, y: u32, color: &str) -> Pixel {
        Pixel {
            canvas_id: main_canvas(),
            x,
            y,
            color: Color::new(color.to_string()).unwrap(),
            user_id: UserId::new("u1".to_string()).unwrap(),
            username: "alice".to_string(),
            last_updated: fixed_time(),
        }
    }

    fn quiet_publisher() -> MockEventPublisher {
        let mut publisher = MockEventPublisher::new();
        publisher
            .expect_publish()
            .withf(|event| event.event_type() == "snapshot.ready")
            .returning(|_| Ok(()));
        publisher
    }

    struct Fixture {
        pixels: Arc<InMemoryPixelRepository>,
        snapshots: Arc<InMemorySnapshotRepository>,
        objects: Arc<InMemoryObjectStore>,
    }

    impl Fixture {
        fn new(page_size: usize) -> Self {
            Self {
                pixels: Arc::new(InMemoryPixelRepository::with_page_size(page_size)),
                snapshots: Arc::new(InMemorySnapshotRepository::new()),
                objects: Arc::new(InMemoryObjectStore::new("https://cdn.example.com")),
            }
        }

        fn usecase(
            &self,
            notifier: MockCallbackNotifier,
            publisher: MockEventPublisher,
            width: u32,
            height: u32,
        ) -> RenderSnapshotUseCase {
            RenderSnapshotUseCase::new(
                self.pixels.clone(),
                self.snapshots.clone(),
                self.objects.clone(),
                Arc::new(notifier),
                Arc::new(publisher),
                Arc::new(FixedClock::new(fixed_time())),
                main_canvas(),
                BoardBounds { width, height },
                "#000000".to_string(),
            )
        }
    }

    /// IDAT を展開して生のスキャンラインを取り出す
    fn decode_scanlines(png: &[u8]) -> Vec<u8> {
        let mut offset = 8;
        let mut idat = Vec::new();
        while offset < png.len() {
            let length = u32::from_be_bytes(png[offset..offset + 4].try_into().unwrap()) as usize;
            let chunk_type = &png[offset + 4..offset + 8];
            if chunk_type == b"IDAT" {
                idat.extend_from_slice(&png[offset + 8..offset + 8 + length]);
            }
            offset += 12 + length;
        }
        let mut raw = Vec::new();
        ZlibDecoder::new(idat.as_slice())
            .read_to_end(&mut raw)
            .unwrap();
        raw
    }

    #[tokio::test]
    async fn test_empty_canvas_renders_background() {
        // テスト項目: ピクセルがない場合、画像全体が背景色になる
        // given (前提条件):
        let fixture = Fixture::new(1000);
        let usecase = fixture.usecase(MockCallbackNotifier::new(), quiet_publisher(), 4, 3);

        // when (操作):
        let record = usecase.execute(request(None)).await.unwrap();

        // then (期待する結果):
        let png = fixture.objects.get_object(&record.object_key).await.unwrap();
        let raw = decode_scanlines(&png);
        assert_eq!(raw.len(), 3 * (1 + 4 * 4));
        for row in raw.chunks(1 + 4 * 4) {
            assert_eq!(row[0], 0);
            for rgba in row[1..].chunks(4) {
                assert_eq!(rgba, [0, 0, 0, 255]);
            }
        }
    }

    #[tokio::test]
    async fn test_snapshot_is_stored_recorded_and_announced() {
        // テスト項目: 画像が保存され、メタデータが記録され、snapshot.ready が発行される
        // given (前提条件):
        let fixture = Fixture::new(2);
        for (x, y) in [(0, 0), (1, 1), (2, 2), (3, 3), (100, 100)] {
            fixture.pixels.put_pixel(pixel(x, y, "#FF0000")).await.unwrap();
        }
        let usecase = fixture.usecase(MockCallbackNotifier::new(), quiet_publisher(), 4, 4);

        // when (操作):
        let record = usecase.execute(request(None)).await.unwrap();

        // then (期待する結果):
        let expected_key = format!(
            "snapshots/main-{}-{}.png",
            fixed_time().timestamp_millis(),
            Uuid::nil()
        );
        assert_eq!(record.object_key, expected_key);
        assert_eq!(record.url, format!("https://cdn.example.com/{}", expected_key));
        assert_eq!(fixture.objects.keys().await, vec![expected_key]);

        // ページをまたいだ 4 ピクセルが対角線上に描かれ、盤面外の (100, 100) は捨てられる
        let raw = decode_scanlines(&fixture.objects.get_object(&record.object_key).await.unwrap());
        let stride = 1 + 4 * 4;
        for i in 0..4 {
            let offset = i * stride + 1 + i * 4;
            assert_eq!(&raw[offset..offset + 4], [255, 0, 0, 255]);
        }

        let listed = fixture.snapshots.list_snapshots(&main_canvas(), 10).await.unwrap();
        assert_eq!(listed, vec![record]);
    }

    #[tokio::test]
    async fn test_callback_failure_is_swallowed() {
        // テスト項目: コールバックに失敗してもスナップショット処理は成功する
        // given (前提条件):
        let fixture = Fixture::new(1000);
        let mut notifier = MockCallbackNotifier::new();
        notifier
            .expect_notify_snapshot()
            .withf(|url, _| url == "https://example.com/hook")
            .times(1)
            .returning(|_, _| Err(TransportError::Unavailable("500".to_string())));
        let usecase = fixture.usecase(notifier, quiet_publisher(), 2, 2);

        // when (操作):
        let result = usecase.execute(request(Some("https://example.com/hook"))).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_redelivery_after_publish_failure_converges() {
        // テスト項目: snapshot.ready の発行に失敗した要求が再配信されても、画像と記録は 1 つに収束する
        // given (前提条件):
        let fixture = Fixture::new(1000);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(TransportError::Unavailable("topic down".to_string()))
            } else {
                Ok(())
            }
        });
        let usecase = fixture.usecase(MockCallbackNotifier::new(), publisher, 2, 2);
        let first = usecase.execute(request(None)).await;

        // when (操作):
        let second = usecase.execute(request(None)).await.unwrap();

        // then (期待する結果):
        assert!(matches!(first, Err(SnapshotError::Transport(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(fixture.objects.keys().await, vec![second.object_key.clone()]);
        let listed = fixture.snapshots.list_snapshots(&main_canvas(), 10).await.unwrap();
        assert_eq!(listed, vec![second]);
    }

    #[tokio::test]
    async fn test_object_store_failure_propagates() {
        // テスト項目: ObjectStore への保存失敗はエラーになり、メタデータは記録されない
        // given (前提条件):
        let pixels = Arc::new(InMemoryPixelRepository::new());
        let snapshots = Arc::new(InMemorySnapshotRepository::new());
        let mut objects = MockObjectStore::new();
        objects
            .expect_put_object()
            .returning(|_, _, _| Err(TransportError::Unavailable("bucket down".to_string())));
        let mut publisher = MockEventPublisher::new();
        publisher.expect_publish().times(0);
        let usecase = RenderSnapshotUseCase::new(
            pixels,
            snapshots.clone(),
            Arc::new(objects),
            Arc::new(MockCallbackNotifier::new()),
            Arc::new(publisher),
            Arc::new(FixedClock::new(fixed_time())),
            main_canvas(),
            BoardBounds {
                width: 2,
                height: 2,
            },
            "#000000".to_string(),
        );

        // when (操作):
        let result = usecase.execute(request(None)).await;

        // then (期待する結果):
        assert!(matches!(result, Err(SnapshotError::Transport(_))));
        assert!(snapshots
            .list_snapshots(&main_canvas(), 10)
            .await
            .unwrap()
            .is_empty());
    }
}
