//! ローカルファイルシステムを使った ObjectStore 実装

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::domain::{ObjectStore, TransportError};

use super::join_url;

/// ディレクトリ配下にオブジェクトを保存する ObjectStore
pub struct FileSystemObjectStore {
    root: PathBuf,
    public_base_url: String,
}

impl FileSystemObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, TransportError> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(TransportError::Unavailable(format!(
                "invalid object key '{key}'"
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStore for FileSystemObjectStore {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), TransportError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        }
        let size = body.len();
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| TransportError::Unavailable(e.to_string()))?;
        tracing::debug!(
            "Stored object '{}' ({} bytes, {}) at {}",
            key,
            size,
            content_type,
            path.display()
        );
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}
