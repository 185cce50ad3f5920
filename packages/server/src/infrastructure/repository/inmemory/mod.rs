//! InMemory Repository 実装

pub mod connection;
pub mod pixel;
pub mod rate_limit;
pub mod session;
pub mod snapshot;

pub use connection::InMemoryConnectionRepository;
pub use pixel::InMemoryPixelRepository;
pub use rate_limit::InMemoryRateLimitRepository;
pub use session::InMemoryGameSessionRepository;
pub use snapshot::InMemorySnapshotRepository;
