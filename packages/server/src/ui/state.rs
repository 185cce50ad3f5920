//! Shared application state.

use std::sync::Arc;

use crate::{
    domain::MessagePusher,
    usecase::{
        AuthorizeUseCase, BoardBounds, ConnectionRegistry, GetCanvasUseCase, GetGameStateUseCase,
        ListSnapshotsUseCase, RequestSnapshotUseCase, SessionGateUseCase, SubmitPixelUseCase,
    },
};

/// Shared application state
pub struct AppState {
    /// Board dimensions reported by `GET /api/canvas`
    pub board: BoardBounds,
    /// 描画受付のユースケース
    pub submit_pixel_usecase: Arc<SubmitPixelUseCase>,
    /// セッション状態遷移のユースケース
    pub session_gate_usecase: Arc<SessionGateUseCase>,
    /// 識別・認可のユースケース
    pub authorize_usecase: Arc<AuthorizeUseCase>,
    /// スナップショット要求のユースケース
    pub request_snapshot_usecase: Arc<RequestSnapshotUseCase>,
    /// スナップショット一覧のユースケース
    pub list_snapshots_usecase: Arc<ListSnapshotsUseCase>,
    /// キャンバス取得のユースケース
    pub get_canvas_usecase: Arc<GetCanvasUseCase>,
    /// ゲーム状態取得のユースケース
    pub get_game_state_usecase: Arc<GetGameStateUseCase>,
    /// ライブ接続のレジストリ
    pub connection_registry: Arc<ConnectionRegistry>,
    /// MessagePusher（ライブ接続へのプッシュの抽象化）
    pub message_pusher: Arc<dyn MessagePusher>,
}
