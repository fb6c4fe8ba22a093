//! Database schemas
//!
//! Persisted document layouts for cocktails and chat users. Both are keyed
//! by their UUID `id` field rather than the store's native `_id`, so the
//! identifier survives export/import.

mod cocktail;
mod metadata;
mod user;

pub use cocktail::{CocktailDoc, COCKTAIL_COLLECTION};
pub use metadata::Metadata;
pub use user::{UserDoc, USER_COLLECTION};
