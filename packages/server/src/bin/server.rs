//! Pixel war server.
//!
//! Accepts single-pixel writes over HTTP, applies them through the draw queue and pushes every
//! accepted write to live viewers over WebSocket.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin pixelwar-server
//! cargo run --bin pixelwar-server -- --host 0.0.0.0 --port 3000 --admins alice --start-running
//! ```

use std::sync::Arc;

use clap::Parser;
use pixelwar_server::{app::Application, config::AppConfig};
use pixelwar_shared::{logger::setup_logger, time::SystemClock};

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = AppConfig::parse();
    let host = config.host.clone();
    let port = config.port;
    tracing::info!(
        "Canvas '{}' ({}x{}), {} pixel(s) per {}s window",
        config.board.canvas_id,
        config.board.width,
        config.board.height,
        config.board.max_pixels_per_window,
        config.board.window_seconds
    );

    // Wire repositories, queues, topic and use cases, then start the background consumers
    let application = match Application::build(config, Arc::new(SystemClock)) {
        Ok(application) => application,
        Err(e) => {
            tracing::error!("Failed to build application: {}", e);
            std::process::exit(1);
        }
    };
    let server = match application.start().await {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start application: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run(host, port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
