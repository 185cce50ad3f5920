//! Value Object 定義
//!
//! 文字列 ID と色を、空文字列を許さない型として表現します。

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ValueObjectError;

macro_rules! non_empty_string {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(value: String) -> Result<Self, ValueObjectError> {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    return Err(ValueObjectError::Empty($label));
                }
                Ok(Self(trimmed.to_string()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = ValueObjectError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

non_empty_string!(
    /// キャンバス ID（例: `main`）
    CanvasId,
    "canvas_id"
);

non_empty_string!(
    /// 描画したユーザーの ID
    UserId,
    "user_id"
);

non_empty_string!(
    /// 再接続をまたいで安定した論理クライアント ID
    ClientId,
    "client_id"
);

non_empty_string!(
    /// ソケットごとに一意なトランスポートハンドル
    ConnectionId,
    "connection_id"
);

non_empty_string!(
    /// 描画色（16 進文字列。形式の検証はエンコード時に行う）
    Color,
    "color"
);

/// 認証されていない描画者に使われるユーザー ID
pub const ANONYMOUS_USER: &str = "anonymous";

impl UserId {
    /// 匿名ユーザー
    pub fn anonymous() -> Self {
        Self(ANONYMOUS_USER.to_string())
    }
}

impl ConnectionId {
    /// 新しいランダムな接続 ID を生成
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}
