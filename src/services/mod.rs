//! Services layer
//!
//! Store-facing operations shared by the JSON API and the chat bot.
//!
//! - **Catalog**: fetch by id or filter, create, update, delete
//! - **Favorites**: chat user registration and favorite lists

pub mod catalog;
pub mod favorites;

pub use catalog::Catalog;
pub use favorites::Favorites;
