//! ドメイン層のエラー定義

use thiserror::Error;

/// Value Object の生成エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// KeyValueStore（Repository）のエラー
///
/// `ConditionFailed` は条件付き更新の「想定された失敗」であり、呼び出し側が分岐に使う。
/// それ以外はインフラ障害として伝播させる。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("conditional check failed")]
    ConditionFailed,
    #[error("invalid continuation token: {0}")]
    InvalidToken(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Queue / Topic / ObjectStore / コールバックなど、ストア以外の外部連携のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("failed to serialize message: {0}")]
    Serialization(String),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

/// 接続へのプッシュ失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PushError {
    /// 接続先がもう存在しない（登録を削除してよい）
    #[error("connection '{0}' is gone")]
    Gone(String),
    /// 一時的な失敗の可能性がある
    #[error("failed to push message: {0}")]
    Transport(String),
}

/// Topic イベントのパースエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventParseError {
    #[error("malformed event: {0}")]
    Malformed(String),
    #[error("event has no type field")]
    MissingType,
    #[error("unknown event type: {0}")]
    UnknownType(String),
}

/// PNG エンコードのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("compression failed: {0}")]
    Compression(String),
}
