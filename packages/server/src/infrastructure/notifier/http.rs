//! HTTP コールバック通知
//!
//! Discord の interaction follow-up（メッセージ編集）と同じ形の JSON を
//! コールバック URL に `PATCH` します。

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::{CallbackNotifier, SnapshotRecord, TransportError};

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);
const EMBED_COLOR: u32 = 0x00FF00;

/// reqwest を使ったコールバック通知
#[derive(Clone)]
pub struct HttpCallbackNotifier {
    client: reqwest::Client,
}

impl HttpCallbackNotifier {
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(CALLBACK_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        Ok(Self { client })
    }
}

/// コールバックに送る本文
pub fn callback_body(record: &SnapshotRecord) -> Value {
    json!({
        "content": format!("📸 Snapshot ready for <@{}>!", record.triggered_by),
        "embeds": [{
            "title": "Canvas Snapshot",
            "description": "Your render is ready, click to open it.",
            "image": { "url": record.url },
            "url": record.url,
            "color": EMBED_COLOR,
            "footer": { "text": format!("Snapshot ID: {}", record.snapshot_id) },
        }],
    })
}

#[async_trait]
impl CallbackNotifier for HttpCallbackNotifier {
    async fn notify_snapshot(
        &self,
        callback_url: &str,
        record: &SnapshotRecord,
    ) -> Result<(), TransportError> {
        let response = self
            .client
            .patch(callback_url)
            .json(&callback_body(record))
            .send()
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Unavailable(format!(
                "callback responded with {status}"
            )));
        }
        tracing::debug!("Snapshot callback delivered ({})", status);
        Ok(())
    }
}
