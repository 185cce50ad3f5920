//! End-to-end tests over real HTTP and WebSocket connections.
//!
//! The server runs in-process on an ephemeral port with its background consumers started,
//! exactly as the binary wires it.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use chrono::Utc;
use clap::Parser;
use futures_util::StreamExt;
use pixelwar_server::{
    app::Application,
    config::AppConfig,
    domain::{CanvasEvent, UserId},
    infrastructure::identity::InMemorySessionDirectory,
};
use pixelwar_shared::time::SystemClock;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

const INTERNAL_SECRET: &str = "integration-secret";
const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Helper struct to manage the in-process server lifecycle
struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
    session_directory: Arc<InMemorySessionDirectory>,
    http: reqwest::Client,
    _snapshot_dir: TempDir,
}

impl TestServer {
    /// Start a server on an ephemeral port
    async fn start() -> Self {
        let snapshot_dir = tempfile::tempdir().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let config = AppConfig::parse_from([
            "pixelwar-server".to_string(),
            "--width".to_string(),
            "32".to_string(),
            "--height".to_string(),
            "16".to_string(),
            "--snapshot-dir".to_string(),
            snapshot_dir.path().display().to_string(),
            "--public-base-url".to_string(),
            format!("http://{}/files", addr),
            "--internal-secret".to_string(),
            INTERNAL_SECRET.to_string(),
            "--admins".to_string(),
            "admin1".to_string(),
        ]);
        let app = Application::build(config, Arc::new(SystemClock)).unwrap();
        let session_directory = app.session_directory();
        let server = app.start().await.unwrap();
        let router = server.router();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        TestServer {
            addr,
            handle,
            session_directory,
            http: reqwest::Client::new(),
            _snapshot_dir: snapshot_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Register a logged-in user and return its bearer session ID
    async fn login(&self, user_id: &str, username: &str) -> String {
        let session_id = format!("session-{}", user_id);
        self.session_directory
            .insert_session(
                session_id.clone(),
                UserId::new(user_id.to_string()).unwrap(),
                username.to_string(),
                Utc::now() + chrono::Duration::hours(1),
            )
            .await;
        session_id
    }

    async fn connect(&self, client_id: &str) -> WsStream {
        self.connect_url(format!("ws://{}/ws?clientId={}", self.addr, client_id)).await
    }

    async fn connect_url(&self, url: String) -> WsStream {
        let (stream, _) = connect_async(url).await.unwrap();
        stream
    }

    async fn active_connections(&self) -> Value {
        let state: Value = self
            .http
            .get(self.url("/api/state"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        state["activeConnections"].clone()
    }

    async fn draw(&self, session_id: &str, body: Value) -> reqwest::Response {
        self.http
            .post(self.url("/api/draw"))
            .bearer_auth(session_id)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn admin(&self, action: &str, body: Value) -> reqwest::Response {
        self.http
            .post(self.url(&format!("/api/admin/{}", action)))
            .header("x-internal-secret", INTERNAL_SECRET)
            .json(&body)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Read frames until an event of `event_type` arrives
async fn next_event(ws: &mut WsStream, event_type: &str) -> CanvasEvent {
    tokio::time::timeout(EVENT_TIMEOUT, async {
        while let Some(frame) = ws.next().await {
            if let Message::Text(text) = frame.unwrap() {
                let event = CanvasEvent::parse(text.as_str()).unwrap();
                if event.event_type() == event_type {
                    return event;
                }
            }
        }
        panic!("connection closed before {} arrived", event_type);
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {}", event_type))
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: ヘルスチェックが 200 を返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = server.http.get(server.url("/api/health")).send().await.unwrap();

    // then (期待する結果):
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_draw_is_rejected_until_canvas_is_opened() {
    // テスト項目: セッション行がない（STOPPED）間の描画は 403 になる
    // given (前提条件):
    let server = TestServer::start().await;
    let session_id = server.login("u1", "Alice").await;

    // when (操作):
    let response = server
        .draw(&session_id, json!({"x": 1, "y": 1, "color": "#FF0000"}))
        .await;

    // then (期待する結果):
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("STOPPED"));
}

#[tokio::test]
async fn test_admin_endpoints_require_an_admin() {
    // テスト項目: 管理 API は未認証なら 401、管理者以外なら 403、管理者なら成功
    // given (前提条件):
    let server = TestServer::start().await;
    let session_id = server.login("u1", "Alice").await;

    // when (操作):
    let anonymous = server
        .http
        .post(server.url("/api/admin/resume"))
        .send()
        .await
        .unwrap();
    let not_admin = server
        .http
        .post(server.url("/api/admin/resume"))
        .bearer_auth(&session_id)
        .send()
        .await
        .unwrap();
    let admin = server.admin("resume", json!({"userId": "admin1"})).await;

    // then (期待する結果):
    assert_eq!(anonymous.status(), 401);
    assert_eq!(not_admin.status(), 403);
    assert_eq!(admin.status(), 200);
    let body: Value = admin.json().await.unwrap();
    assert_eq!(body["status"], "RUNNING");
}

#[tokio::test]
async fn test_pause_from_stopped_is_a_conflict() {
    // テスト項目: STOPPED からの pause は 409 になる
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = server.admin("pause", json!({"userId": "admin1"})).await;

    // then (期待する結果):
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn test_invalid_draw_requests_are_rejected() {
    // テスト項目: 盤外の座標、空の色、座標の欠落は 400 になる
    // given (前提条件):
    let server = TestServer::start().await;
    let session_id = server.login("u1", "Alice").await;
    server.admin("resume", json!({"userId": "admin1"})).await;

    // when (操作):
    let out_of_board = server
        .draw(&session_id, json!({"x": 32, "y": 0, "color": "#FF0000"}))
        .await;
    let empty_color = server
        .draw(&session_id, json!({"x": 0, "y": 0, "color": "  "}))
        .await;
    let missing_y = server
        .draw(&session_id, json!({"x": 0, "color": "#FF0000"}))
        .await;

    // then (期待する結果):
    assert_eq!(out_of_board.status(), 400);
    assert_eq!(empty_color.status(), 400);
    assert_eq!(missing_y.status(), 400);
}

#[tokio::test]
async fn test_connections_sharing_an_unknown_session_keep_one_row() {
    // テスト項目: 解決できない sessionId でも、同じ sessionId の古い接続は登録から外れる
    // given (前提条件):
    let server = TestServer::start().await;
    let _first = server
        .connect_url(format!("ws://{}/ws?clientId=c1&sessionId=tab-session", server.addr))
        .await;
    assert_eq!(server.active_connections().await, 1);

    // when (操作):
    let _second = server
        .connect_url(format!("ws://{}/ws?clientId=c2&sessionId=tab-session", server.addr))
        .await;

    // then (期待する結果):
    assert_eq!(server.active_connections().await, 1);
}

#[tokio::test]
async fn test_live_viewer_sees_draws_and_snapshots() {
    // テスト項目: 描画とスナップショットがライブ接続に届き、REST からも参照できる
    // given (前提条件):
    let server = TestServer::start().await;
    let session_id = server.login("u1", "Alice").await;
    let mut viewer = server.connect("viewer-1").await;

    // when (操作): キャンバスを開いて 1 ピクセル描く
    let resumed = server.admin("resume", json!({"userId": "admin1"})).await;
    assert_eq!(resumed.status(), 200);
    next_event(&mut viewer, "session.resumed").await;

    let response = server
        .draw(&session_id, json!({"x": 10, "y": 5, "color": "#FF0000"}))
        .await;
    assert_eq!(response.status(), 202);

    // then (期待する結果):
    match next_event(&mut viewer, "pixel.drawn").await {
        CanvasEvent::PixelDrawn {
            x,
            y,
            color,
            user_id,
            username,
            ..
        } => {
            assert_eq!((x, y), (10, 5));
            assert_eq!(color.as_str(), "#FF0000");
            assert_eq!(user_id.as_str(), "u1");
            assert_eq!(username, "Alice");
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let canvas: Value = server
        .http
        .get(server.url("/api/canvas"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(canvas["width"], 32);
    assert_eq!(canvas["height"], 16);
    assert_eq!(canvas["pixels"].as_array().unwrap().len(), 1);
    assert_eq!(canvas["pixels"][0]["color"], "#FF0000");

    let state: Value = server
        .http
        .get(server.url("/api/state"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["status"], "RUNNING");
    assert_eq!(state["activeConnections"], 1);

    // when (操作): スナップショットを要求する
    let queued = server.admin("snapshot", json!({"userId": "admin1"})).await;
    assert_eq!(queued.status(), 202);
    let queued: Value = queued.json().await.unwrap();
    assert_eq!(queued["status"], "pending");

    // then (期待する結果):
    let url = match next_event(&mut viewer, "snapshot.ready").await {
        CanvasEvent::SnapshotReady {
            snapshot_id,
            url,
            requested_by,
            ..
        } => {
            assert_eq!(snapshot_id, queued["requestId"].as_str().unwrap());
            assert_eq!(requested_by, "admin1");
            url
        }
        other => panic!("unexpected event: {:?}", other),
    };
    let image = server.http.get(&url).send().await.unwrap();
    assert_eq!(image.status(), 200);
    let bytes = image.bytes().await.unwrap();
    assert_eq!(&bytes[..8], [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]);

    let listed: Value = server
        .http
        .get(server.url("/api/snapshots"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["snapshots"].as_array().unwrap().len(), 1);
    assert_eq!(listed["snapshots"][0]["url"], url.as_str());
}
