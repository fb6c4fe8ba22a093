//! Filter query builder
//!
//! Turns a [`CocktailFilter`] into a [`QueryPlan`]: a predicate tree plus a
//! skip/limit pair. The tree renders to a MongoDB filter document for the
//! real store and can be evaluated directly against a [`Cocktail`] for the
//! in-memory store, so both backends agree on what a filter means.
//!
//! Shape of the compound predicate:
//!
//! ```text
//! $and: [
//!   $or: [ id == a, id == b, ... ],                       // ids, if any
//!   $or: [ $or: [ name ~ x, ... ], $or: [ russian_name ~ x, ... ] ]
//! ]
//! ```
//!
//! An id clause and a name clause are AND-ed; the two name languages are
//! OR-ed with each other. A filter with no clauses is the universal match
//! `{}`, never "match nothing".

use bson::{doc, Bson, Document};
use regex::RegexBuilder;
use uuid::Uuid;

use crate::domain::{Cocktail, CocktailFilter, Pagination, DEFAULT_LIMIT};

/// Characters allowed around a searched fragment
const NAME_PADDING: &str = "[a-zA-Zа-яА-ЯёЁ0-9 ]*";

/// Name field a substring predicate applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    /// Primary (English) name
    Primary,
    /// Localized (Russian) name
    Localized,
}

impl NameField {
    pub fn field_name(&self) -> &'static str {
        match self {
            NameField::Primary => "name",
            NameField::Localized => "russian_name",
        }
    }

    fn value<'a>(&self, cocktail: &'a Cocktail) -> &'a str {
        match self {
            NameField::Primary => &cocktail.name,
            NameField::Localized => &cocktail.russian_name,
        }
    }
}

/// Predicate tree over catalog items
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Matches every item
    All,
    IdEquals(Uuid),
    /// Case-insensitive substring match of `fragment` in `field`
    NameMatches { field: NameField, fragment: String },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Regex pattern used for a name fragment.
    ///
    /// The fragment is escaped, so user text is always matched literally.
    pub fn name_pattern(fragment: &str) -> String {
        format!(
            "{pad}({frag}){pad}",
            pad = NAME_PADDING,
            frag = regex::escape(fragment)
        )
    }

    /// Render as a MongoDB filter document
    pub fn to_document(&self) -> Document {
        match self {
            Predicate::All => doc! {},
            Predicate::IdEquals(id) => doc! { "id": uuid_to_bson(id) },
            Predicate::NameMatches { field, fragment } => {
                let mut filter = Document::new();
                filter.insert(
                    field.field_name(),
                    doc! {
                        "$regex": Self::name_pattern(fragment),
                        "$options": "im",
                    },
                );
                filter
            }
            Predicate::And(clauses) => doc! { "$and": Self::documents(clauses) },
            Predicate::Or(clauses) => doc! { "$or": Self::documents(clauses) },
        }
    }

    fn documents(clauses: &[Predicate]) -> Vec<Bson> {
        clauses
            .iter()
            .map(|c| Bson::Document(c.to_document()))
            .collect()
    }

    /// Evaluate against an item, with the same semantics as the store query
    pub fn matches(&self, cocktail: &Cocktail) -> bool {
        match self {
            Predicate::All => true,
            Predicate::IdEquals(id) => cocktail.id == *id,
            Predicate::NameMatches { field, fragment } => {
                match RegexBuilder::new(&Self::name_pattern(fragment))
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                {
                    Ok(re) => re.is_match(field.value(cocktail)),
                    Err(_) => false,
                }
            }
            Predicate::And(clauses) => clauses.iter().all(|c| c.matches(cocktail)),
            Predicate::Or(clauses) => clauses.iter().any(|c| c.matches(cocktail)),
        }
    }
}

/// Backend query: predicate plus window.
///
/// `limit == 0` means "no limit", as with MongoDB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub predicate: Predicate,
    pub skip: u64,
    pub limit: u64,
}

/// Build the query plan for a filter. Pure.
pub fn build(filter: &CocktailFilter) -> QueryPlan {
    let (skip, limit) = window(&filter.pagination);
    QueryPlan {
        predicate: build_predicate(filter),
        skip,
        limit,
    }
}

/// Predicate part of [`build`], also used on its own for count queries
pub fn build_predicate(filter: &CocktailFilter) -> Predicate {
    let ids = (!filter.ids.is_empty())
        .then(|| Predicate::Or(filter.ids.iter().copied().map(Predicate::IdEquals).collect()));

    let any_name: Vec<Predicate> = [
        name_clause(NameField::Primary, &filter.names),
        name_clause(NameField::Localized, &filter.russian_names),
    ]
    .into_iter()
    .flatten()
    .collect();
    let names = (!any_name.is_empty()).then(|| Predicate::Or(any_name));

    let clauses: Vec<Predicate> = [ids, names].into_iter().flatten().collect();
    if clauses.is_empty() {
        Predicate::All
    } else {
        Predicate::And(clauses)
    }
}

fn name_clause(field: NameField, fragments: &[String]) -> Option<Predicate> {
    if fragments.is_empty() {
        return None;
    }
    Some(Predicate::Or(
        fragments
            .iter()
            .map(|f| Predicate::NameMatches {
                field,
                fragment: f.clone(),
            })
            .collect(),
    ))
}

/// Skip/limit for a pagination descriptor
fn window(pagination: &Pagination) -> (u64, u64) {
    if pagination.is_unspecified() {
        (0, DEFAULT_LIMIT)
    } else {
        (
            pagination.page.saturating_mul(pagination.items_per_page),
            pagination.items_per_page,
        )
    }
}

pub(crate) fn uuid_to_bson(id: &Uuid) -> bson::Uuid {
    bson::Uuid::from_bytes(id.into_bytes())
}

pub(crate) fn uuid_from_bson(id: &bson::Uuid) -> Uuid {
    Uuid::from_bytes(id.bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cocktail(name: &str, russian_name: &str) -> Cocktail {
        Cocktail {
            id: Uuid::new_v4(),
            name: name.to_string(),
            russian_name: russian_name.to_string(),
            ..Default::default()
        }
    }

    fn catalog() -> Vec<Cocktail> {
        vec![
            cocktail("Classic Mojito", "Классический мохито"),
            cocktail("Negroni", "Негрони"),
            cocktail("", ""),
            cocktail("Old Fashioned", "Олд фэшн"),
        ]
    }

    #[test]
    fn test_empty_filter_is_universal() {
        let plan = build(&CocktailFilter::default());
        assert_eq!(plan.predicate, Predicate::All);
        assert_eq!(plan.predicate.to_document(), doc! {});
        assert!(catalog().iter().all(|c| plan.predicate.matches(c)));
    }

    #[test]
    fn test_empty_filter_with_pagination_is_still_universal() {
        let plan = build(&CocktailFilter::page(Pagination::new(3, 5)));
        assert_eq!(plan.predicate, Predicate::All);
        assert_eq!(plan.skip, 15);
        assert_eq!(plan.limit, 5);
    }

    #[test]
    fn test_unspecified_pagination_defaults_to_first_ten() {
        let plan = build(&CocktailFilter::default());
        assert_eq!((plan.skip, plan.limit), (0, DEFAULT_LIMIT));
    }

    #[test]
    fn test_explicit_first_page() {
        let plan = build(&CocktailFilter::page(Pagination::new(0, 25)));
        assert_eq!((plan.skip, plan.limit), (0, 25));
    }

    #[test]
    fn test_id_predicate_is_or_of_equalities() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let filter = CocktailFilter {
            ids: vec![a, b],
            ..Default::default()
        };
        let predicate = build_predicate(&filter);
        assert_eq!(
            predicate,
            Predicate::And(vec![Predicate::Or(vec![
                Predicate::IdEquals(a),
                Predicate::IdEquals(b)
            ])])
        );

        let doc = predicate.to_document();
        let and = doc.get_array("$and").unwrap();
        let or = and[0].as_document().unwrap().get_array("$or").unwrap();
        assert_eq!(or.len(), 2);
    }

    #[test]
    fn test_names_in_both_languages_are_or_combined() {
        let filter = CocktailFilter::by_name("negr", Pagination::default());
        let predicate = build_predicate(&filter);
        match &predicate {
            Predicate::And(clauses) => {
                assert_eq!(clauses.len(), 1);
                match &clauses[0] {
                    Predicate::Or(langs) => assert_eq!(langs.len(), 2),
                    other => panic!("unexpected clause {:?}", other),
                }
            }
            other => panic!("unexpected predicate {:?}", other),
        }

        let items = catalog();
        let matched: Vec<_> = items.iter().filter(|c| predicate.matches(c)).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].name, "Negroni");
    }

    #[test]
    fn test_id_and_name_are_and_combined() {
        let items = catalog();
        let negroni = items[1].id;
        let mojito = items[0].id;

        let filter = CocktailFilter {
            ids: vec![negroni, mojito],
            names: vec!["mojito".into()],
            ..Default::default()
        };
        let predicate = build_predicate(&filter);
        let matched: Vec<_> = items.iter().filter(|c| predicate.matches(c)).collect();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, mojito);
    }

    #[test]
    fn test_localized_name_alone_matches_item() {
        let filter = CocktailFilter {
            ids: vec![],
            names: vec!["zzz".into()],
            russian_names: vec!["мохито".into()],
            pagination: Pagination::default(),
        };
        let predicate = build_predicate(&filter);
        let items = catalog();
        assert!(predicate.matches(&items[0]));
        assert!(!predicate.matches(&items[1]));
    }

    #[test]
    fn test_name_match_is_case_insensitive_substring() {
        let predicate = build_predicate(&CocktailFilter::by_name("MOJITO", Pagination::default()));
        assert!(predicate.matches(&cocktail("Classic Mojito", "")));
        assert!(!predicate.matches(&cocktail("Daiquiri", "")));
    }

    #[test]
    fn test_fragment_is_escaped() {
        let pattern = Predicate::name_pattern("(mojito");
        assert!(pattern.contains(r"\(mojito"));

        let predicate = build_predicate(&CocktailFilter::by_name("(mojito", Pagination::default()));
        assert!(!predicate.matches(&cocktail("Classic Mojito", "")));
        assert!(predicate.matches(&cocktail("Classic (Mojito", "")));
    }

    #[test]
    fn test_name_document_shape() {
        let predicate = Predicate::NameMatches {
            field: NameField::Localized,
            fragment: "негрони".into(),
        };
        let doc = predicate.to_document();
        let inner = doc.get_document("russian_name").unwrap();
        assert_eq!(inner.get_str("$options").unwrap(), "im");
        assert!(inner.get_str("$regex").unwrap().contains("(негрони)"));
    }

    #[test]
    fn test_id_document_uses_uuid_binary() {
        let id = Uuid::new_v4();
        let doc = Predicate::IdEquals(id).to_document();
        assert_eq!(doc.get("id"), Some(&Bson::from(uuid_to_bson(&id))));
        assert_eq!(uuid_from_bson(&uuid_to_bson(&id)), id);
    }
}
