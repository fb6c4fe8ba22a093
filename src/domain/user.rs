//! Chat user with a favorites list

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    /// Internal identifier, assigned on registration
    pub id: Uuid,
    /// Chat-platform user id
    pub telegram_id: i64,
    /// Favorited cocktail ids, insertion ordered, no duplicates
    pub favorite_cocktails: Vec<Uuid>,
}

impl User {
    pub fn new(telegram_id: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            telegram_id,
            favorite_cocktails: Vec::new(),
        }
    }

    pub fn has_favorite(&self, cocktail_id: &Uuid) -> bool {
        self.favorite_cocktails.contains(cocktail_id)
    }

    /// Add a favorite. Returns false when it was already present.
    pub fn add_favorite(&mut self, cocktail_id: Uuid) -> bool {
        if self.has_favorite(&cocktail_id) {
            return false;
        }
        self.favorite_cocktails.push(cocktail_id);
        true
    }

    /// Remove a favorite. Returns false when it was not present.
    pub fn remove_favorite(&mut self, cocktail_id: &Uuid) -> bool {
        match self.favorite_cocktails.iter().position(|id| id == cocktail_id) {
            Some(index) => {
                self.favorite_cocktails.remove(index);
                true
            }
            None => false,
        }
    }
}
