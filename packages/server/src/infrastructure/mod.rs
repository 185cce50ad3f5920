//! Infrastructure 層
//!
//! ドメイン層の trait の具体的な実装（インメモリのストア、プロセス内のキューと Topic、
//! WebSocket プッシュ、ファイルシステムの ObjectStore、HTTP コールバック）と DTO。

pub mod dto;
pub mod identity;
pub mod message_pusher;
pub mod notifier;
pub mod object_store;
pub mod queue;
pub mod repository;
pub mod topic;
