//! UseCase: ライブ接続のレジストリ
//!
//! 同じ `client_id`（と `session_id`）の古い接続は、新しい接続の登録時に削除する。
//! 削除と登録はアトミックではないが、残った古い行はファンアウト時に「接続先なし」として
//! 刈り取られるため最終的に 1 行に収束する。

use std::{collections::HashSet, sync::Arc};

use pixelwar_shared::time::Clock;

use crate::domain::{ClientId, Connection, ConnectionId, ConnectionRepository, Identity, Page};

use super::error::RegistryError;

/// 1 回のスキャンで取得する接続数
pub const DEFAULT_CONNECTION_PAGE_SIZE: usize = 100;

/// 接続レジストリのユースケース
pub struct ConnectionRegistry {
    repository: Arc<dyn ConnectionRepository>,
    clock: Arc<dyn Clock>,
    page_size: usize,
}

impl ConnectionRegistry {
    pub fn new(repository: Arc<dyn ConnectionRepository>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repository,
            clock,
            page_size: DEFAULT_CONNECTION_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// 接続を登録する
    ///
    /// 同じ `client_id`、または同じ `session_id` を持つ別の接続を先に削除する。
    /// `session_id` は接続時に渡された値そのもので、解決できなかったセッションでも重複排除に使う。
    /// 省略時は `identity` のセッション ID を使う。
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        client_id: ClientId,
        session_id: Option<String>,
        identity: Option<Identity>,
    ) -> Result<Connection, RegistryError> {
        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .or_else(|| identity.as_ref().and_then(|i| i.session_id.clone()));

        let mut stale = self.repository.find_by_client_id(&client_id).await?;
        if let Some(session_id) = session_id.as_deref() {
            stale.extend(self.repository.find_by_session_id(session_id).await?);
        }

        let mut removed = HashSet::new();
        for connection in stale {
            if connection.connection_id == connection_id
                || !removed.insert(connection.connection_id.clone())
            {
                continue;
            }
            tracing::info!(
                "Removing stale connection '{}' of client '{}'",
                connection.connection_id,
                connection.client_id
            );
            self.repository
                .delete_connection(&connection.connection_id)
                .await?;
        }

        let connection = Connection {
            connection_id,
            client_id,
            session_id,
            user_id: identity.as_ref().map(|i| i.user_id.clone()),
            username: identity.map(|i| i.username),
            connected_at: self.clock.now(),
        };
        self.repository.put_connection(connection.clone()).await?;
        tracing::info!(
            "Registered connection '{}' for client '{}'",
            connection.connection_id,
            connection.client_id
        );
        Ok(connection)
    }

    /// 接続を削除する（存在しなくても成功）
    pub async fn unregister(&self, connection_id: &ConnectionId) -> Result<(), RegistryError> {
        self.repository.delete_connection(connection_id).await?;
        tracing::debug!("Unregistered connection '{}'", connection_id);
        Ok(())
    }

    /// 接続を 1 ページ分取得する
    pub async fn list_page(
        &self,
        start: Option<String>,
    ) -> Result<Page<Connection>, RegistryError> {
        Ok(self
            .repository
            .scan_connections(start, self.page_size)
            .await?)
    }

    /// すべての接続を取得する（ページを最後まで辿る）
    pub async fn list_all(&self) -> Result<Vec<Connection>, RegistryError> {
        let mut connections = Vec::new();
        let mut start = None;
        loop {
            let page = self.list_page(start).await?;
            connections.extend(page.items);
            match page.next {
                Some(next) => start = Some(next),
                None => break,
            }
        }
        Ok(connections)
    }

    /// 接続中のユニークな client_id の数
    pub async fn count_unique_clients(&self) -> Result<usize, RegistryError> {
        let connections = self.list_all().await?;
        let clients: HashSet<ClientId> = connections.into_iter().map(|c| c.client_id).collect();
        Ok(clients.len())
    }
}
