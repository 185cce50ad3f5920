//! WebSocket connection handlers.
//!
//! A live viewer connects to `GET /ws?clientId=...&sessionId=...`. Every topic event is pushed
//! to it verbatim until the socket closes.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ClientId, ConnectionId, Identity},
    ui::state::AppState,
    usecase::Credentials,
};

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectQuery {
    pub client_id: Option<String>,
    pub session_id: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let connection_id = ConnectionId::generate();

    // clientId を省略した場合は接続 ID を使う
    let client_id = match query.client_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => ClientId::try_from(id).map_err(|_| StatusCode::BAD_REQUEST)?,
        None => ClientId::try_from(connection_id.as_str()).map_err(|_| StatusCode::BAD_REQUEST)?,
    };

    let session_id = query.session_id.filter(|id| !id.trim().is_empty());
    let identity = resolve_identity(&state, session_id.clone()).await;

    // Channel はレジストリより先に登録する（未登録の接続はファンアウトで刈り取られる）
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register_channel(connection_id.clone(), tx)
        .await;

    if let Err(e) = state
        .connection_registry
        .register(
            connection_id.clone(),
            client_id.clone(),
            session_id,
            identity,
        )
        .await
    {
        tracing::error!("Failed to register connection '{}': {}", connection_id, e);
        state.message_pusher.unregister_channel(&connection_id).await;
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }

    tracing::info!("Client '{}' connected as '{}'", client_id, connection_id);
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id, rx)))
}

async fn resolve_identity(state: &AppState, session_id: Option<String>) -> Option<Identity> {
    let credentials = Credentials {
        session_id: Some(session_id?),
        ..Credentials::default()
    };

    match state.authorize_usecase.identify(&credentials).await {
        Ok(identity) => identity,
        Err(e) => {
            tracing::warn!("Failed to resolve session for live connection: {}", e);
            None
        }
    }
}

/// Spawns a task that receives messages from the rx channel and pushes them to the WebSocket sender.
///
/// # Arguments
///
/// * `rx` - Channel receiver fed by the fan-out
/// * `sender` - WebSocket sink of this connection
///
/// # Returns
///
/// A `JoinHandle` for the spawned task
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    connection_id: ConnectionId,
    rx: mpsc::UnboundedReceiver<String>,
) {
    let (sender, mut receiver) = socket.split();

    let connection_id_for_recv = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id_for_recv, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    // 描画は HTTP で受け付けるため、クライアントからのテキストは読み捨てる
                    tracing::debug!(
                        "Ignoring {} byte(s) from '{}'",
                        text.len(),
                        connection_id_for_recv
                    );
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id_for_recv);
                    break;
                }
                _ => {}
            }
        }
    });

    let mut send_task = pusher_loop(rx, sender);

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    state.message_pusher.unregister_channel(&connection_id).await;
    match state.connection_registry.unregister(&connection_id).await {
        Ok(()) => tracing::info!("Connection '{}' closed and unregistered", connection_id),
        Err(e) => tracing::warn!(
            "Failed to unregister connection '{}': {}",
            connection_id,
            e
        ),
    }
}
