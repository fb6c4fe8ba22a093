//! Catalog filter and paged result

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cocktail;

/// Limit applied when the caller did not specify pagination at all
pub const DEFAULT_LIMIT: u64 = 10;

/// Zero-based page index and page size.
///
/// `Pagination::default()` (page 0, size 0) means "not specified" and
/// resolves to the first `DEFAULT_LIMIT` items.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pagination {
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub items_per_page: u64,
}

impl Pagination {
    pub fn new(page: u64, items_per_page: u64) -> Self {
        Self {
            page,
            items_per_page,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        self.page == 0 && self.items_per_page == 0
    }
}

/// Optional predicates over the catalog. An empty filter matches everything.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CocktailFilter {
    pub ids: Vec<Uuid>,
    pub names: Vec<String>,
    pub russian_names: Vec<String>,
    pub pagination: Pagination,
}

impl CocktailFilter {
    /// Unrestricted filter for one page of the whole catalog
    pub fn page(pagination: Pagination) -> Self {
        Self {
            pagination,
            ..Default::default()
        }
    }

    /// Single-id lookup
    pub fn by_id(id: Uuid) -> Self {
        Self {
            ids: vec![id],
            ..Default::default()
        }
    }

    /// Substring search over both name languages
    pub fn by_name(text: &str, pagination: Pagination) -> Self {
        Self {
            names: vec![text.to_string()],
            russian_names: vec![text.to_string()],
            pagination,
            ..Default::default()
        }
    }
}

/// One page of matching items plus the total matching count
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CocktailsPaged {
    pub items: Vec<Cocktail>,
    pub total_count: u64,
}

impl CocktailsPaged {
    pub fn empty() -> Self {
        Self::default()
    }
}
