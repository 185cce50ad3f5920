//! ユーザー識別と管理者判定の実装
//!
//! ログイン（OAuth）によるセッション発行はこのクレートの範囲外です。
//! 埋め込み側がセッションを [`InMemorySessionDirectory::insert_session`] で登録します。

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pixelwar_shared::time::Clock;
use tokio::sync::RwLock;

use crate::domain::{AdminDirectory, Identity, IdentityResolver, StoreError, UserId};

struct SessionRow {
    user_id: UserId,
    username: String,
    expires_at: DateTime<Utc>,
}

/// インメモリのセッションテーブル
pub struct InMemorySessionDirectory {
    /// Key: session_id
    sessions: RwLock<HashMap<String, SessionRow>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySessionDirectory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// セッションを登録（同じ ID は上書き）
    pub async fn insert_session(
        &self,
        session_id: String,
        user_id: UserId,
        username: String,
        expires_at: DateTime<Utc>,
    ) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            session_id,
            SessionRow {
                user_id,
                username,
                expires_at,
            },
        );
    }
}

#[async_trait]
impl IdentityResolver for InMemorySessionDirectory {
    async fn resolve_session(&self, session_id: &str) -> Result<Option<Identity>, StoreError> {
        let sessions = self.sessions.read().await;
        let Some(row) = sessions.get(session_id) else {
            return Ok(None);
        };
        if self.clock.now() > row.expires_at {
            tracing::debug!("Session '{}' has expired", session_id);
            return Ok(None);
        }
        Ok(Some(Identity {
            user_id: row.user_id.clone(),
            username: row.username.clone(),
            session_id: Some(session_id.to_string()),
        }))
    }
}

/// 設定で与えられた管理者ユーザー ID の一覧
pub struct StaticAdminDirectory {
    admins: HashSet<String>,
}

impl StaticAdminDirectory {
    pub fn new<I, S>(admins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            admins: admins
                .into_iter()
                .map(Into::into)
                .map(|s: String| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

#[async_trait]
impl AdminDirectory for StaticAdminDirectory {
    async fn is_admin(&self, user_id: &UserId) -> bool {
        self.admins.contains(user_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use pixelwar_shared::time::FixedClock;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_valid_session() {
        // テスト項目: 有効なセッションからユーザーを解決できる
        // given (前提条件):
        let directory = InMemorySessionDirectory::new(Arc::new(FixedClock::new(now())));
        directory
            .insert_session(
                "s1".to_string(),
                UserId::new("u1".to_string()).unwrap(),
                "alice".to_string(),
                now() + Duration::hours(1),
            )
            .await;

        // when (操作):
        let identity = directory.resolve_session("s1").await.unwrap();

        // then (期待する結果):
        let identity = identity.unwrap();
        assert_eq!(identity.user_id.as_str(), "u1");
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.session_id.as_deref(), Some("s1"));
    }

    #[tokio::test]
    async fn test_expired_or_unknown_session_is_unauthenticated() {
        // テスト項目: 期限切れ・未知のセッションは None
        // given (前提条件):
        let clock = Arc::new(FixedClock::new(now()));
        let directory = InMemorySessionDirectory::new(clock.clone());
        directory
            .insert_session(
                "s1".to_string(),
                UserId::new("u1".to_string()).unwrap(),
                "alice".to_string(),
                now() + Duration::minutes(5),
            )
            .await;
        clock.advance(Duration::minutes(6));

        // when (操作):
        let expired = directory.resolve_session("s1").await.unwrap();
        let unknown = directory.resolve_session("nope").await.unwrap();

        // then (期待する結果):
        assert!(expired.is_none());
        assert!(unknown.is_none());
    }

    #[tokio::test]
    async fn test_static_admin_directory() {
        // テスト項目: 設定された ID だけが管理者と判定される
        // given (前提条件):
        let directory = StaticAdminDirectory::new([" admin1 ", "", "admin2"]);

        // when (操作):
        let admin = directory.is_admin(&UserId::new("admin1".to_string()).unwrap()).await;
        let other = directory.is_admin(&UserId::new("u1".to_string()).unwrap()).await;

        // then (期待する結果):
        assert!(admin);
        assert!(!other);
    }
}
