//! Persistence: query building, MongoDB access, store collaborators

pub mod mongo;
pub mod query;
pub mod schemas;
pub mod store;

pub use mongo::MongoClient;
pub use query::{build, build_predicate, NameField, Predicate, QueryPlan};
pub use store::{
    CatalogStore, InMemoryCatalogStore, InMemoryUserStore, MongoCatalogStore, MongoUserStore,
    UserStore,
};
