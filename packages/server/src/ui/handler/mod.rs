//! HTTP and WebSocket handlers.

pub mod http;
pub mod websocket;

pub use http::{
    admin_pause, admin_resume, admin_snapshot, draw_pixel, get_canvas, get_game_state,
    health_check, list_snapshots,
};
pub use websocket::websocket_handler;
