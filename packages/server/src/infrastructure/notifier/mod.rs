//! スナップショット完了コールバックの実装
//!
//! ## 実装
//!
//! - `http`: reqwest でコールバック URL に PATCH する

pub mod http;

pub use http::HttpCallbackNotifier;
