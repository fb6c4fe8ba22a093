//! Shared types for JustShake

pub mod error;

pub use error::{JustShakeError, Result};
