//! Catalog domain model
//!
//! Plain data shared by the store layer, the JSON API and the chat bot.
//! Nothing here knows about MongoDB or Telegram.

mod cocktail;
mod filter;
mod user;

pub use cocktail::{Cocktail, CocktailItem, Recipe, Tag};
pub use filter::{CocktailFilter, CocktailsPaged, Pagination, DEFAULT_LIMIT};
pub use user::User;
