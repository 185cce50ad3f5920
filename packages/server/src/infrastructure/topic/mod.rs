//! Topic（pub/sub）の実装
//!
//! ## 実装
//!
//! - `broadcast`: `tokio::sync::broadcast` を使ったプロセス内 Topic

pub mod broadcast;

pub use broadcast::BroadcastTopic;
