//! Catalog operations shared by the JSON API and the bot
//!
//! Every store call goes through the query builder and is bounded by the
//! request timeout. Counts are always a separate query over the same
//! predicate, never inferred from the page length.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{self, CatalogStore};
use crate::domain::{Cocktail, CocktailFilter, CocktailsPaged, Pagination};
use crate::types::Result;

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
    timeout: Duration,
}

impl Catalog {
    pub fn new(store: Arc<dyn CatalogStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.timeout, call).await?
    }

    pub async fn fetch_by_id(&self, id: Uuid) -> Result<Option<Cocktail>> {
        let plan = db::build(&CocktailFilter::by_id(id));
        self.bounded(self.store.find_one(&plan.predicate)).await
    }

    /// One page of matches plus the total matching count
    pub async fn fetch_by_filter(&self, filter: &CocktailFilter) -> Result<CocktailsPaged> {
        let plan = db::build(filter);
        debug!(skip = plan.skip, limit = plan.limit, "Fetching cocktails by filter");

        let items = self
            .bounded(self.store.find(&plan.predicate, plan.skip, plan.limit))
            .await?;
        let total_count = self.bounded(self.store.count(&plan.predicate)).await?;

        Ok(CocktailsPaged { items, total_count })
    }

    /// One page of the whole catalog
    pub async fn fetch_page(&self, page: u64, page_size: u64) -> Result<CocktailsPaged> {
        self.fetch_by_filter(&CocktailFilter::page(Pagination::new(page, page_size)))
            .await
    }

    /// Insert a cocktail under a freshly assigned id, ignoring any id it carries
    pub async fn create(&self, mut cocktail: Cocktail) -> Result<Uuid> {
        cocktail.id = Uuid::new_v4();
        let id = cocktail.id;
        self.bounded(self.store.insert(cocktail)).await?;
        info!(%id, "Cocktail created");
        Ok(id)
    }

    /// Replace the cocktail stored under `id`. The id itself never changes.
    pub async fn update(&self, id: Uuid, mut cocktail: Cocktail) -> Result<bool> {
        cocktail.id = id;
        let updated = self.bounded(self.store.replace(cocktail)).await?;
        if updated {
            info!(%id, "Cocktail updated");
        }
        Ok(updated)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = self.bounded(self.store.delete(id)).await?;
        if deleted {
            info!(%id, "Cocktail deleted");
        }
        Ok(deleted)
    }
}
