//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{EncodeError, SessionStatus, StoreError, TransportError};

/// 描画リクエストが受け付けられなかった理由（ユーザーに返す結果）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawRejection {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("session is not running (current status: {0})")]
    SessionNotRunning(SessionStatus),
    #[error("rate limit exceeded")]
    RateLimited,
}

/// 描画受付（同期パス）のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Rejected(#[from] DrawRejection),
    #[error("storage failure: {0}")]
    Storage(StoreError),
    #[error("failed to enqueue draw: {0}")]
    Queue(TransportError),
}

/// 描画ワーカーのエラー（キューの再配信に任せる）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DrawWorkerError {
    #[error("storage failure: {0}")]
    Storage(StoreError),
    #[error("failed to publish event: {0}")]
    Publish(TransportError),
}

/// ゲームセッションの状態遷移エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionGateError {
    #[error("cannot {action} a session in status {current}")]
    InvalidTransition {
        action: &'static str,
        current: SessionStatus,
    },
    #[error("storage failure: {0}")]
    Storage(StoreError),
    #[error("failed to publish event: {0}")]
    Transport(TransportError),
}

/// 管理者認可のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("user '{0}' is not an admin")]
    Forbidden(String),
    #[error("identity lookup failed: {0}")]
    Storage(StoreError),
}

/// スナップショット処理のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    #[error("storage failure: {0}")]
    Storage(StoreError),
    #[error("failed to encode snapshot: {0}")]
    Encode(EncodeError),
    #[error("transport failure: {0}")]
    Transport(TransportError),
}

/// 接続レジストリのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}
