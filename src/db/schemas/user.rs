//! Chat user document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::query::{uuid_from_bson, uuid_to_bson};
use crate::db::schemas::Metadata;
use crate::domain::User;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// User document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct UserDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Internal identifier
    pub id: bson::Uuid,

    /// Telegram user id
    pub telegram_id: i64,

    #[serde(default)]
    pub favorite_cocktails: Vec<bson::Uuid>,
}

impl From<User> for UserDoc {
    fn from(u: User) -> Self {
        Self {
            _id: None,
            metadata: Metadata::default(),
            id: uuid_to_bson(&u.id),
            telegram_id: u.telegram_id,
            favorite_cocktails: u.favorite_cocktails.iter().map(uuid_to_bson).collect(),
        }
    }
}

impl From<UserDoc> for User {
    fn from(d: UserDoc) -> Self {
        Self {
            id: uuid_from_bson(&d.id),
            telegram_id: d.telegram_id,
            favorite_cocktails: d.favorite_cocktails.iter().map(uuid_from_bson).collect(),
        }
    }
}

impl IntoIndexes for UserDoc {
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
            // One document per chat account
            (
                doc! { "telegram_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("telegram_id_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_favorites_survive_conversion_in_order() {
        let mut user = User::new(42);
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        user.add_favorite(a);
        user.add_favorite(b);

        let back = User::from(UserDoc::from(user.clone()));
        assert_eq!(back, user);
        assert_eq!(back.favorite_cocktails, vec![a, b]);
    }
}
