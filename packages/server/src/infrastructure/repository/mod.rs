//! Repository の実装
//!
//! ## 実装
//!
//! - `inmemory`: プロセス内の HashMap / BTreeMap を使った実装

pub mod inmemory;

pub use inmemory::{
    InMemoryConnectionRepository, InMemoryGameSessionRepository, InMemoryPixelRepository,
    InMemoryRateLimitRepository, InMemorySnapshotRepository,
};
