//! UI layer: HTTP / WebSocket endpoints and the background queue and topic consumers.

pub mod consumer;
pub mod handler;
pub mod server;
pub mod signal;
pub mod state;

pub use server::Server;
pub use state::AppState;
