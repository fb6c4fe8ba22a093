//! Chat user registration and favorites
//!
//! Favorite edits are read-modify-write without a concurrency token, so two
//! racing edits from the same user resolve as last write wins.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::db::UserStore;
use crate::domain::User;
use crate::types::{JustShakeError, Result};

#[derive(Clone)]
pub struct Favorites {
    users: Arc<dyn UserStore>,
    timeout: Duration,
}

impl Favorites {
    pub fn new(users: Arc<dyn UserStore>, timeout: Duration) -> Self {
        Self { users, timeout }
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call).await?
    }

    pub async fn find_user(&self, telegram_id: i64) -> Result<Option<User>> {
        self.bounded(self.users.find_by_telegram_id(telegram_id)).await
    }

    /// Register a chat user. Registering twice returns the existing user.
    pub async fn register(&self, telegram_id: i64) -> Result<User> {
        if let Some(existing) = self.find_user(telegram_id).await? {
            return Ok(existing);
        }

        let user = User::new(telegram_id);
        self.bounded(self.users.insert(user.clone())).await?;
        info!(telegram_id, user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Delete a chat user. Returns false when they were not registered.
    pub async fn unregister(&self, telegram_id: i64) -> Result<bool> {
        let deleted = self.bounded(self.users.delete_user(telegram_id)).await?;
        if deleted {
            info!(telegram_id, "User deleted");
        }
        Ok(deleted)
    }

    pub async fn add(&self, telegram_id: i64, cocktail_id: Uuid) -> Result<User> {
        self.edit(telegram_id, |user| user.add_favorite(cocktail_id))
            .await
    }

    pub async fn remove(&self, telegram_id: i64, cocktail_id: Uuid) -> Result<User> {
        self.edit(telegram_id, |user| user.remove_favorite(&cocktail_id))
            .await
    }

    async fn edit(&self, telegram_id: i64, change: impl FnOnce(&mut User) -> bool) -> Result<User> {
        let mut user = self
            .find_user(telegram_id)
            .await?
            .ok_or_else(|| JustShakeError::NotFound(format!("user {} is not registered", telegram_id)))?;

        if change(&mut user) {
            self.bounded(
                self.users
                    .update_favorites(telegram_id, &user.favorite_cocktails),
            )
            .await?;
        }
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryUserStore;

    fn favorites() -> Favorites {
        Favorites::new(Arc::new(InMemoryUserStore::new()), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_register_is_idempotent() {
        let favorites = favorites();
        let first = favorites.register(42).await.unwrap();
        let second = favorites.register(42).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_list() {
        let favorites = favorites();
        favorites.register(42).await.unwrap();
        let existing = Uuid::new_v4();
        favorites.add(42, existing).await.unwrap();
        let before = favorites.find_user(42).await.unwrap().unwrap().favorite_cocktails;

        let x = Uuid::new_v4();
        let added = favorites.add(42, x).await.unwrap();
        assert!(added.has_favorite(&x));
        favorites.remove(42, x).await.unwrap();

        let after = favorites.find_user(42).await.unwrap().unwrap().favorite_cocktails;
        assert_eq!(after, before);
    }

    #[tokio::test]
    async fn test_edit_requires_registration() {
        let favorites = favorites();
        let err = favorites.add(7, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, JustShakeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unregister() {
        let favorites = favorites();
        favorites.register(42).await.unwrap();
        assert!(favorites.unregister(42).await.unwrap());
        assert!(!favorites.unregister(42).await.unwrap());
        assert!(favorites.find_user(42).await.unwrap().is_none());
    }
}
