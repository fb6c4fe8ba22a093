//! Cocktail document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::query::{uuid_from_bson, uuid_to_bson};
use crate::db::schemas::Metadata;
use crate::domain::{Cocktail, CocktailItem, Recipe, Tag};

/// Collection name for cocktails
pub const COCKTAIL_COLLECTION: &str = "cocktails";

/// Cocktail document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CocktailDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Stable catalog identifier
    pub id: bson::Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub russian_name: String,

    #[serde(default)]
    pub country_of_origin: String,

    #[serde(default)]
    pub history: String,

    #[serde(default)]
    pub tags: Vec<Tag>,

    #[serde(default)]
    pub composition_elements: Vec<CocktailItem>,

    #[serde(default)]
    pub tools: Vec<CocktailItem>,

    #[serde(default)]
    pub recipe: Recipe,
}

impl From<Cocktail> for CocktailDoc {
    fn from(c: Cocktail) -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            id: uuid_to_bson(&c.id),
            url: c.url,
            name: c.name,
            russian_name: c.russian_name,
            country_of_origin: c.country_of_origin,
            history: c.history,
            tags: c.tags,
            composition_elements: c.composition_elements,
            tools: c.tools,
            recipe: c.recipe,
        }
    }
}

impl From<CocktailDoc> for Cocktail {
    fn from(d: CocktailDoc) -> Self {
        Self {
            id: uuid_from_bson(&d.id),
            url: d.url,
            name: d.name,
            russian_name: d.russian_name,
            country_of_origin: d.country_of_origin,
            history: d.history,
            tags: d.tags,
            composition_elements: d.composition_elements,
            tools: d.tools,
            recipe: d.recipe,
        }
    }
}

impl IntoIndexes for CocktailDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("id_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "name": 1 },
                Some(IndexOptions::builder().name("name_index".to_string()).build()),
            ),
            (
                doc! { "russian_name": 1 },
                Some(
                    IndexOptions::builder()
                        .name("russian_name_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for CocktailDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
