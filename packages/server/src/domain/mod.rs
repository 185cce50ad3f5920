//! ドメイン層
//!
//! エンティティ、Value Object、メッセージ定義、PNG エンコーダ、
//! および外部コラボレータの trait を定義します。

pub mod entity;
pub mod error;
pub mod event;
pub mod gateway;
pub mod png;
pub mod repository;
pub mod value_object;

pub use entity::{
    Connection, GameSession, Identity, Pixel, RateLimitBucket, SessionStatus, SnapshotRecord,
};
pub use error::{
    EncodeError, EventParseError, PushError, StoreError, TransportError, ValueObjectError,
};
pub use event::{CanvasEvent, DrawMessage, SnapshotRequest};
pub use gateway::{
    AdminDirectory, CallbackNotifier, EventPublisher, IdentityResolver, MessagePusher,
    MessageQueue, ObjectStore, PusherChannel,
};
pub use png::{PixelMap, Rgba, encode_png};
pub use repository::{
    ConnectionRepository, GameSessionRepository, Page, PixelRepository, RateLimitRepository,
    SnapshotRepository,
};
pub use value_object::{ANONYMOUS_USER, CanvasId, ClientId, Color, ConnectionId, UserId};
