//! JustShake - cocktail catalog with a JSON API and a Telegram bot
//!
//! ## Components
//!
//! - **Catalog**: filter query building over a MongoDB (or in-memory) store
//! - **Navigation**: compact control payloads and page controls
//! - **Sessions**: short-lived per-user conversation state
//! - **Bot**: stateless orchestrator rendering chat surfaces
//! - **API**: JSON read and CRUD endpoints over the same catalog

pub mod bot;
pub mod config;
pub mod db;
pub mod domain;
pub mod navigation;
pub mod routes;
pub mod server;
pub mod services;
pub mod session;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{JustShakeError, Result};
