//! ObjectStore の実装
//!
//! ## 実装
//!
//! - `filesystem`: ローカルディレクトリに保存し、HTTP サーバーから静的配信する
//! - `inmemory`: テスト用

pub mod filesystem;
pub mod inmemory;

pub use filesystem::FileSystemObjectStore;
pub use inmemory::InMemoryObjectStore;

/// 公開 URL を `base_url` と `key` から組み立てる
pub(crate) fn join_url(base_url: &str, key: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        key.trim_start_matches('/')
    )
}
