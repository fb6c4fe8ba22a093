//! Cocktail aggregate

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog entry.
///
/// `id` is assigned once on creation and never reassigned on update.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Cocktail {
    pub id: Uuid,
    pub url: Option<String>,
    /// Primary (English) name
    pub name: String,
    /// Localized (Russian) name, used as the display name in the bot
    pub russian_name: String,
    pub country_of_origin: String,
    pub history: String,
    pub tags: Vec<Tag>,
    pub composition_elements: Vec<CocktailItem>,
    pub tools: Vec<CocktailItem>,
    pub recipe: Recipe,
}

impl Cocktail {
    /// Name shown on list controls: localized name, falling back to the primary one
    pub fn display_name(&self) -> &str {
        if self.russian_name.trim().is_empty() {
            &self.name
        } else {
            &self.russian_name
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Tag {
    pub name: String,
}

/// Composition or tool entry: name, quantity and unit
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct CocktailItem {
    pub name: String,
    pub count: i32,
    pub unit: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Recipe {
    pub steps: Vec<String>,
}
