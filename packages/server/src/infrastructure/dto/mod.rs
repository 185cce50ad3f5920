//! Data Transfer Objects (DTOs) for the pixelwar HTTP API.
//!
//! WebSocket clients receive topic events verbatim, so only HTTP needs DTOs.

pub mod conversion;
pub mod http;
