//! Server configuration.
//!
//! Every option can be given on the command line or through a `PIXELWAR_*` environment variable.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::{
    domain::{CanvasId, ValueObjectError},
    usecase::BoardBounds,
};

/// Board dimensions and draw policy
#[derive(Debug, Clone, Args)]
pub struct BoardConfig {
    /// Identifier of the canvas served by this process
    #[arg(long = "canvas-id", env = "PIXELWAR_CANVAS_ID", default_value = "main")]
    pub canvas_id: String,

    /// Board width in pixels
    #[arg(long, env = "PIXELWAR_BOARD_WIDTH", default_value_t = 256)]
    pub width: u32,

    /// Board height in pixels
    #[arg(long, env = "PIXELWAR_BOARD_HEIGHT", default_value_t = 256)]
    pub height: u32,

    /// Maximum accepted draws per user within one window
    #[arg(long, env = "PIXELWAR_MAX_PIXELS_PER_WINDOW", default_value_t = 20)]
    pub max_pixels_per_window: u32,

    /// Width of a rate-limit window in seconds
    #[arg(long, env = "PIXELWAR_WINDOW_SECONDS", default_value_t = 60)]
    pub window_seconds: u32,

    /// Color of unset pixels in snapshots
    #[arg(long, env = "PIXELWAR_BACKGROUND", default_value = "#000000")]
    pub background: String,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            canvas_id: "main".to_string(),
            width: 256,
            height: 256,
            max_pixels_per_window: 20,
            window_seconds: 60,
            background: "#000000".to_string(),
        }
    }
}

impl BoardConfig {
    pub fn canvas_id(&self) -> Result<CanvasId, ValueObjectError> {
        CanvasId::new(self.canvas_id.clone())
    }

    pub fn bounds(&self) -> BoardBounds {
        BoardBounds {
            width: self.width,
            height: self.height,
        }
    }
}

/// Process configuration
#[derive(Debug, Clone, Parser)]
#[command(name = "pixelwar-server")]
#[command(about = "Shared pixel canvas server with live WebSocket fan-out", long_about = None)]
pub struct AppConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "PIXELWAR_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PIXELWAR_PORT", default_value_t = 8080)]
    pub port: u16,

    #[command(flatten)]
    pub board: BoardConfig,

    /// Directory where snapshot images are written
    #[arg(long, env = "PIXELWAR_SNAPSHOT_DIR", default_value = "./snapshots")]
    pub snapshot_dir: PathBuf,

    /// Public base URL under which the snapshot directory is served
    #[arg(
        long,
        env = "PIXELWAR_PUBLIC_BASE_URL",
        default_value = "http://127.0.0.1:8080/files"
    )]
    pub public_base_url: String,

    /// Shared secret that marks a request as coming from a trusted internal caller
    #[arg(long, env = "PIXELWAR_INTERNAL_SECRET")]
    pub internal_secret: Option<String>,

    /// Comma-separated user IDs allowed to run admin operations
    #[arg(long, env = "PIXELWAR_ADMINS", value_delimiter = ',')]
    pub admins: Vec<String>,

    /// Deliveries of a queue message before it is dead-lettered
    #[arg(long, env = "PIXELWAR_QUEUE_MAX_RECEIVE_COUNT", default_value_t = 3)]
    pub queue_max_receive_count: u32,

    /// Open the canvas (RUNNING) on startup instead of waiting for an admin resume
    #[arg(long, env = "PIXELWAR_START_RUNNING")]
    pub start_running: bool,
}
