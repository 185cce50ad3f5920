//! Utilities shared by the pixelwar server binary and its library crate.

pub mod logger;
pub mod time;
