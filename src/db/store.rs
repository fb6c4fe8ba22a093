//! Store collaborators
//!
//! The catalog and user stores are traits so the services can run against
//! MongoDB in production and against in-memory maps in dev mode and tests.
//! Both implementations interpret a [`Predicate`] identically.

use std::collections::HashMap;

use async_trait::async_trait;
use bson::doc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::mongo::{MongoClient, MongoCollection};
use crate::db::query::{uuid_to_bson, Predicate};
use crate::db::schemas::{CocktailDoc, UserDoc, COCKTAIL_COLLECTION, USER_COLLECTION};
use crate::domain::{Cocktail, User};
use crate::types::{JustShakeError, Result};

// ============================================================================
// Traits (for dependency injection)
// ============================================================================

/// Catalog persistence
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Items matching `predicate`, in insertion order. `limit == 0` is unbounded.
    async fn find(&self, predicate: &Predicate, skip: u64, limit: u64) -> Result<Vec<Cocktail>>;

    /// Number of items matching `predicate`
    async fn count(&self, predicate: &Predicate) -> Result<u64>;

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<Cocktail>>;

    /// Insert a new item. Fails when the id is already taken.
    async fn insert(&self, cocktail: Cocktail) -> Result<()>;

    /// Replace every field but the id. Returns false when no item has that id.
    async fn replace(&self, cocktail: Cocktail) -> Result<bool>;

    /// Returns false when no item has that id
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Chat user persistence, keyed by Telegram user id
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>>;

    /// Insert a new user. Fails when the Telegram id is already registered.
    async fn insert(&self, user: User) -> Result<()>;

    /// Overwrite the favorites list. Returns false when the user does not exist.
    async fn update_favorites(&self, telegram_id: i64, favorites: &[Uuid]) -> Result<bool>;

    /// Returns false when the user does not exist
    async fn delete_user(&self, telegram_id: i64) -> Result<bool>;
}

// ============================================================================
// MongoDB
// ============================================================================

pub struct MongoCatalogStore {
    collection: MongoCollection<CocktailDoc>,
}

impl MongoCatalogStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(COCKTAIL_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl CatalogStore for MongoCatalogStore {
    async fn find(&self, predicate: &Predicate, skip: u64, limit: u64) -> Result<Vec<Cocktail>> {
        let docs = self
            .collection
            .find_many(predicate.to_document(), skip, limit)
            .await?;
        Ok(docs.into_iter().map(Cocktail::from).collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64> {
        self.collection.count(predicate.to_document()).await
    }

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<Cocktail>> {
        let doc = self.collection.find_one(predicate.to_document()).await?;
        Ok(doc.map(Cocktail::from))
    }

    async fn insert(&self, cocktail: Cocktail) -> Result<()> {
        self.collection.insert_one(CocktailDoc::from(cocktail)).await
    }

    async fn replace(&self, cocktail: Cocktail) -> Result<bool> {
        let id = uuid_to_bson(&cocktail.id);
        let mut fields = bson::to_document(&CocktailDoc::from(cocktail))?;
        for key in ["_id", "id", "metadata"] {
            fields.remove(key);
        }

        let result = self
            .collection
            .update_one(doc! { "id": id }, doc! { "$set": fields })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "id": uuid_to_bson(&id) })
            .await?;
        Ok(result.deleted_count > 0)
    }
}

pub struct MongoUserStore {
    collection: MongoCollection<UserDoc>,
}

impl MongoUserStore {
    pub async fn new(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(USER_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>> {
        let doc = self
            .collection
            .find_one(doc! { "telegram_id": telegram_id })
            .await?;
        Ok(doc.map(User::from))
    }

    async fn insert(&self, user: User) -> Result<()> {
        self.collection.insert_one(UserDoc::from(user)).await
    }

    async fn update_favorites(&self, telegram_id: i64, favorites: &[Uuid]) -> Result<bool> {
        let list: Vec<bson::Uuid> = favorites.iter().map(uuid_to_bson).collect();
        let result = self
            .collection
            .update_one(
                doc! { "telegram_id": telegram_id },
                doc! { "$set": { "favorite_cocktails": list } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete_user(&self, telegram_id: i64) -> Result<bool> {
        let result = self
            .collection
            .delete_one(doc! { "telegram_id": telegram_id })
            .await?;
        Ok(result.deleted_count > 0)
    }
}

// ============================================================================
// In-memory (dev mode and tests)
// ============================================================================

/// Insertion-ordered catalog held in memory
#[derive(Default)]
pub struct InMemoryCatalogStore {
    items: RwLock<Vec<Cocktail>>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(items: Vec<Cocktail>) -> Self {
        Self {
            items: RwLock::new(items),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn find(&self, predicate: &Predicate, skip: u64, limit: u64) -> Result<Vec<Cocktail>> {
        let items = self.items.read().await;
        let matching = items
            .iter()
            .filter(|c| predicate.matches(c))
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .cloned();

        Ok(if limit == 0 {
            matching.collect()
        } else {
            matching
                .take(usize::try_from(limit).unwrap_or(usize::MAX))
                .collect()
        })
    }

    async fn count(&self, predicate: &Predicate) -> Result<u64> {
        let items = self.items.read().await;
        Ok(items.iter().filter(|c| predicate.matches(c)).count() as u64)
    }

    async fn find_one(&self, predicate: &Predicate) -> Result<Option<Cocktail>> {
        let items = self.items.read().await;
        Ok(items.iter().find(|c| predicate.matches(c)).cloned())
    }

    async fn insert(&self, cocktail: Cocktail) -> Result<()> {
        let mut items = self.items.write().await;
        if items.iter().any(|c| c.id == cocktail.id) {
            return Err(JustShakeError::Database(format!(
                "duplicate cocktail id {}",
                cocktail.id
            )));
        }
        items.push(cocktail);
        Ok(())
    }

    async fn replace(&self, cocktail: Cocktail) -> Result<bool> {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|c| c.id == cocktail.id) {
            Some(slot) => {
                *slot = cocktail;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|c| c.id != id);
        Ok(items.len() != before)
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<i64, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&telegram_id).cloned())
    }

    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.telegram_id) {
            return Err(JustShakeError::Database(format!(
                "duplicate telegram id {}",
                user.telegram_id
            )));
        }
        users.insert(user.telegram_id, user);
        Ok(())
    }

    async fn update_favorites(&self, telegram_id: i64, favorites: &[Uuid]) -> Result<bool> {
        match self.users.write().await.get_mut(&telegram_id) {
            Some(user) => {
                user.favorite_cocktails = favorites.to_vec();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, telegram_id: i64) -> Result<bool> {
        Ok(self.users.write().await.remove(&telegram_id).is_some())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::query::{build, build_predicate};
    use crate::domain::{CocktailFilter, Pagination};

    fn named(name: &str) -> Cocktail {
        Cocktail {
            id: Uuid::new_v4(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn store_with(count: usize) -> InMemoryCatalogStore {
        InMemoryCatalogStore::with_items((0..count).map(|i| named(&format!("Drink {}", i))).collect())
    }

    #[tokio::test]
    async fn test_find_applies_skip_and_limit() {
        let store = store_with(25);
        let plan = build(&CocktailFilter::page(Pagination::new(2, 10)));
        let page = store.find(&plan.predicate, plan.skip, plan.limit).await.unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].name, "Drink 20");
    }

    #[tokio::test]
    async fn test_zero_limit_is_unbounded() {
        let store = store_with(25);
        let all = store.find(&Predicate::All, 0, 0).await.unwrap();
        assert_eq!(all.len(), 25);
    }

    #[tokio::test]
    async fn test_count_ignores_window() {
        let store = store_with(25);
        let predicate = build_predicate(&CocktailFilter::by_name("drink 1", Pagination::new(0, 3)));
        // "Drink 1" and "Drink 10".."Drink 19"
        assert_eq!(store.count(&predicate).await.unwrap(), 11);
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_id() {
        let store = InMemoryCatalogStore::new();
        let item = named("Negroni");
        store.insert(item.clone()).await.unwrap();
        assert!(store.insert(item).await.is_err());
    }

    #[tokio::test]
    async fn test_replace_and_delete_report_missing() {
        let store = InMemoryCatalogStore::new();
        assert!(!store.replace(named("Ghost")).await.unwrap());
        assert!(!store.delete(Uuid::new_v4()).await.unwrap());

        let mut item = named("Negroni");
        store.insert(item.clone()).await.unwrap();
        item.history = "Флоренция".into();
        assert!(store.replace(item.clone()).await.unwrap());
        let found = store
            .find_one(&Predicate::IdEquals(item.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.history, "Флоренция");
        assert!(store.delete(item.id).await.unwrap());
        assert_eq!(store.count(&Predicate::All).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_user_store_roundtrip() {
        let store = InMemoryUserStore::new();
        let user = User::new(42);
        store.insert(user.clone()).await.unwrap();
        assert!(store.insert(User::new(42)).await.is_err());

        let fav = Uuid::new_v4();
        assert!(store.update_favorites(42, &[fav]).await.unwrap());
        assert!(!store.update_favorites(7, &[fav]).await.unwrap());

        let found = store.find_by_telegram_id(42).await.unwrap().unwrap();
        assert_eq!(found.favorite_cocktails, vec![fav]);
        assert_eq!(found.id, user.id);

        assert!(store.delete_user(42).await.unwrap());
        assert!(store.find_by_telegram_id(42).await.unwrap().is_none());
    }
}
