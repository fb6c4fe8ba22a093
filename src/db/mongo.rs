//! MongoDB client and collection wrapper
//!
//! Typed collections apply their schema indexes when opened and stamp
//! metadata on writes. Callers pass filter documents built by
//! [`crate::db::query`]; nothing here composes predicates itself.

use bson::{doc, Document};
use mongodb::{
    options::{IndexOptions, UpdateModifications},
    results::{DeleteResult, UpdateResult},
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info};

use crate::db::schemas::Metadata;
use crate::types::JustShakeError;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and ping. Fails fast when the server is unreachable.
    pub async fn new(uri: &str, db_name: &str) -> Result<Self, JustShakeError> {
        info!(db = %db_name, "Connecting to MongoDB");

        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| JustShakeError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| JustShakeError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection, creating its indexes
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>, JustShakeError>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    pub async fn new(
        client: &Client,
        db_name: &str,
        collection_name: &str,
    ) -> Result<Self, JustShakeError> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<(), JustShakeError> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| JustShakeError::Database(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    pub async fn insert_one(&self, mut item: T) -> Result<(), JustShakeError> {
        *item.mut_metadata() = Metadata::new();

        self.inner
            .insert_one(item)
            .await
            .map_err(|e| JustShakeError::Database(format!("Insert failed: {}", e)))?;

        Ok(())
    }

    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, JustShakeError> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| JustShakeError::Database(format!("Find failed: {}", e)))
    }

    /// Find a window of documents in insertion order. `limit == 0` is unbounded.
    pub async fn find_many(
        &self,
        filter: Document,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<T>, JustShakeError> {
        use futures_util::StreamExt;

        let mut find = self.inner.find(filter).sort(doc! { "_id": 1 }).skip(skip);
        if limit > 0 {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let cursor = find
            .await
            .map_err(|e| JustShakeError::Database(format!("Find failed: {}", e)))?;

        let results: Vec<T> = cursor
            .filter_map(|doc| async {
                match doc {
                    Ok(d) => Some(d),
                    Err(e) => {
                        error!("Error reading document: {}", e);
                        None
                    }
                }
            })
            .collect()
            .await;

        Ok(results)
    }

    pub async fn count(&self, filter: Document) -> Result<u64, JustShakeError> {
        self.inner
            .count_documents(filter)
            .await
            .map_err(|e| JustShakeError::Database(format!("Count failed: {}", e)))
    }

    /// Update one document, bumping `metadata.updated_at`
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<UpdateResult, JustShakeError> {
        let mut update = update;
        match update.get_document_mut("$set") {
            Ok(set) => {
                set.insert("metadata.updated_at", bson::DateTime::now());
            }
            Err(_) => {
                update.insert("$set", doc! { "metadata.updated_at": bson::DateTime::now() });
            }
        }

        self.inner
            .update_one(filter, UpdateModifications::Document(update))
            .await
            .map_err(|e| JustShakeError::Database(format!("Update failed: {}", e)))
    }

    pub async fn delete_one(&self, filter: Document) -> Result<DeleteResult, JustShakeError> {
        self.inner
            .delete_one(filter)
            .await
            .map_err(|e| JustShakeError::Database(format!("Delete failed: {}", e)))
    }
}
