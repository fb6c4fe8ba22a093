//! Per-user conversation state
//!
//! A short-lived mapping from chat user to a state token, used to turn the
//! stateless callback channel into a two-step conversation ("send me the
//! name to search for").

mod cache;
mod state;

pub use cache::{
    spawn_cleanup_task, InMemorySessionCache, SessionCache, SessionCacheStats, MAX_SESSION_TTL,
};
pub use state::SessionState;
