//! InMemory Connection Repository 実装
//!
//! 主キーは connection_id。`client_id` と `session_id` による検索は全件走査で行います。

use std::{collections::BTreeMap, ops::Bound};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ClientId, Connection, ConnectionId, ConnectionRepository, Page, StoreError};

/// インメモリ Connection Repository 実装
///
/// Key: connection_id
#[derive(Default)]
pub struct InMemoryConnectionRepository {
    connections: Mutex<BTreeMap<String, Connection>>,
}

impl InMemoryConnectionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRepository for InMemoryConnectionRepository {
    async fn put_connection(&self, connection: Connection) -> Result<(), StoreError> {
        let mut connections = self.connections.lock().await;
        connections.insert(connection.connection_id.as_str().to_string(), connection);
        Ok(())
    }

    async fn delete_connection(&self, connection_id: &ConnectionId) -> Result<(), StoreError> {
        let mut connections = self.connections.lock().await;
        connections.remove(connection_id.as_str());
        Ok(())
    }

    async fn find_by_client_id(&self, client_id: &ClientId) -> Result<Vec<Connection>, StoreError> {
        let connections = self.connections.lock().await;
        Ok(connections
            .values()
            .filter(|c| &c.client_id == client_id)
            .cloned()
            .collect())
    }

    async fn find_by_session_id(&self, session_id: &str) -> Result<Vec<Connection>, StoreError> {
        let connections = self.connections.lock().await;
        Ok(connections
            .values()
            .filter(|c| c.session_id.as_deref() == Some(session_id))
            .cloned()
            .collect())
    }

    async fn scan_connections(
        &self,
        start: Option<String>,
        limit: usize,
    ) -> Result<Page<Connection>, StoreError> {
        let lower = match start {
            Some(token) => Bound::Excluded(token),
            None => Bound::Unbounded,
        };

        let connections = self.connections.lock().await;
        let mut range = connections
            .range::<String, _>((lower, Bound::Unbounded))
            .peekable();

        let mut items = Vec::new();
        while items.len() < limit.max(1) {
            match range.next() {
                Some((_, connection)) => items.push(connection.clone()),
                None => break,
            }
        }

        let next = match (range.peek(), items.last()) {
            (Some(_), Some(last)) => Some(last.connection_id.as_str().to_string()),
            _ => None,
        };
        Ok(Page { items, next })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn connection(id: &str, client: &str, session: Option<&str>) -> Connection {
        Connection {
            connection_id: ConnectionId::new(id.to_string()).unwrap(),
            client_id: ClientId::new(client.to_string()).unwrap(),
            session_id: session.map(str::to_string),
            user_id: None,
            username: None,
            connected_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_find_by_client_and_session() {
        // テスト項目: client_id / session_id で接続を検索できる
        // given (前提条件):
        let repository = InMemoryConnectionRepository::new();
        repository.put_connection(connection("c1", "alice", Some("s1"))).await.unwrap();
        repository.put_connection(connection("c2", "bob", Some("s1"))).await.unwrap();
        repository.put_connection(connection("c3", "alice", None)).await.unwrap();

        // when (操作):
        let by_client = repository
            .find_by_client_id(&ClientId::new("alice".to_string()).unwrap())
            .await
            .unwrap();
        let by_session = repository.find_by_session_id("s1").await.unwrap();

        // then (期待する結果):
        assert_eq!(by_client.len(), 2);
        assert_eq!(by_session.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        // テスト項目: 存在しない接続の削除も成功する
        // given (前提条件):
        let repository = InMemoryConnectionRepository::new();
        let id = ConnectionId::new("c1".to_string()).unwrap();

        // when (操作):
        let first = repository.delete_connection(&id).await;
        let second = repository.delete_connection(&id).await;

        // then (期待する結果):
        assert!(first.is_ok());
        assert!(second.is_ok());
    }

    #[tokio::test]
    async fn test_scan_paginates() {
        // テスト項目: limit ごとにページングされ、最後のページの next は None
        // given (前提条件):
        let repository = InMemoryConnectionRepository::new();
        for i in 0..5 {
            repository
                .put_connection(connection(&format!("c{i}"), &format!("client{i}"), None))
                .await
                .unwrap();
        }

        // when (操作):
        let first = repository.scan_connections(None, 2).await.unwrap();
        let second = repository.scan_connections(first.next.clone(), 2).await.unwrap();
        let third = repository.scan_connections(second.next.clone(), 2).await.unwrap();

        // then (期待する結果):
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next.as_deref(), Some("c1"));
        assert_eq!(second.items.len(), 2);
        assert_eq!(third.items.len(), 1);
        assert_eq!(third.next, None);
    }
}
