//! Server execution logic.

use std::{path::PathBuf, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::{
    handler::{
        admin_pause, admin_resume, admin_snapshot, draw_pixel, get_canvas, get_game_state,
        health_check, list_snapshots, websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Pixel canvas HTTP / WebSocket server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state, "./snapshots".into());
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    /// Directory served under `/files` (snapshot images)
    snapshot_dir: PathBuf,
}

impl Server {
    pub fn new(state: Arc<AppState>, snapshot_dir: PathBuf) -> Self {
        Self {
            state,
            snapshot_dir,
        }
    }

    /// Build the router with every endpoint
    pub fn router(&self) -> Router {
        Router::new()
            // WebSocket エンドポイント
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/health", get(health_check))
            .route("/api/draw", post(draw_pixel))
            .route("/api/canvas", get(get_canvas))
            .route("/api/state", get(get_game_state))
            .route("/api/snapshots", get(list_snapshots))
            .route("/api/admin/pause", post(admin_pause))
            .route("/api/admin/resume", post(admin_resume))
            .route("/api/admin/snapshot", post(admin_snapshot))
            // スナップショット画像
            .nest_service("/files", ServeDir::new(&self.snapshot_dir))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Pixel war server listening on {}", listener.local_addr()?);
        tracing::info!("Live updates: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener).await
    }

    /// Serve on an already bound listener until a shutdown signal arrives
    pub async fn serve(self, listener: TcpListener) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
