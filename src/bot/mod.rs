//! Telegram bot front-end
//!
//! The bot is a stateless state machine: every inbound event carries enough
//! context (in the control payload or the session cache) to compute the next
//! surface.
//!
//! - **controls**: control kinds and payload parsing
//! - **surface**: text plus rows of controls, independent of any chat API
//! - **render**: cocktail card text
//! - **service**: the orchestrator mapping events to surfaces
//! - **telegram**: Bot API long-polling transport

pub mod controls;
pub mod render;
pub mod service;
pub mod surface;
pub mod telegram;

pub use controls::{ControlAction, ControlKind};
pub use service::{BotSettings, CatalogService, InboundEvent, Reply};
pub use surface::{Control, RenderTarget, Surface};
pub use telegram::{dispatch, run_polling, ChatTransport, TelegramClient};
