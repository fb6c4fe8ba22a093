//! HTTP server: accept loop, router and shared state

pub mod http;

pub use http::{run, AppState, StorageBackend};
