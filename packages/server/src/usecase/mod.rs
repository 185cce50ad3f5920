//! UseCase 層
//!
//! ドメイン層の trait を組み合わせて、描画の受付・処理、セッションの状態遷移、
//! ライブ接続へのファンアウト、スナップショットの生成を行います。

pub mod authorize;
pub mod broadcast_events;
pub mod connection_registry;
pub mod error;
pub mod get_canvas;
pub mod get_game_state;
pub mod list_snapshots;
pub mod process_draw;
pub mod rate_limiter;
pub mod render_snapshot;
pub mod request_snapshot;
pub mod session_gate;
pub mod submit_pixel;

pub use authorize::{AuthorizeUseCase, Credentials};
pub use broadcast_events::{BroadcastFanout, FanoutReport};
pub use connection_registry::ConnectionRegistry;
pub use error::{
    AuthError, DrawRejection, DrawWorkerError, RegistryError, SessionGateError, SnapshotError,
    SubmitError,
};
pub use get_canvas::GetCanvasUseCase;
pub use get_game_state::{GameState, GetGameStateUseCase};
pub use list_snapshots::ListSnapshotsUseCase;
pub use process_draw::{DrawOutcome, ProcessDrawUseCase};
pub use rate_limiter::RateLimiter;
pub use render_snapshot::RenderSnapshotUseCase;
pub use request_snapshot::RequestSnapshotUseCase;
pub use session_gate::SessionGateUseCase;
pub use submit_pixel::{BoardBounds, DrawCommand, SubmitPixelUseCase};
