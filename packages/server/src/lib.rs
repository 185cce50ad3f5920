//! Shared pixel canvas server.
//!
//! Layers:
//!
//! - `domain`: entities, value objects, wire messages, the PNG encoder and collaborator traits
//! - `infrastructure`: in-process implementations of the store, queue, topic and object store
//! - `usecase`: draw ingestion, session gate, fan-out and snapshot pipelines
//! - `ui`: axum HTTP / WebSocket endpoints and background consumers

pub mod app;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
