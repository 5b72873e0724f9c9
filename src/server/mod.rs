//! HTTP server for hrm

pub mod http;

pub use http::{run, serve, shutdown_signal, AppState};
