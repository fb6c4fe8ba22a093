//! Cocktail catalog JSON API
//!
//! ## Endpoints
//!
//! - `GET    /api/v1/cocktails/{id}`      - Single cocktail
//! - `POST   /api/v1/cocktails/by-filter` - Filtered page (ids, names, pagination)
//! - `GET    /api/v1/cocktails`           - Filtered page from the query string
//! - `POST   /api/v1/cocktails`           - Create, id assigned server-side
//! - `PUT    /api/v1/cocktails/{id}`      - Replace everything but the id
//! - `DELETE /api/v1/cocktails/{id}`      - Delete
//!
//! These call straight through to the catalog service. Navigation and
//! session handling belong to the bot only.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::domain::{Cocktail, CocktailFilter, CocktailItem, CocktailsPaged, Pagination, Recipe, Tag};
use crate::services::Catalog;
use crate::types::JustShakeError;

type FullBody = Full<Bytes>;

/// Path prefix shared by every cocktail endpoint
pub const COCKTAILS_PATH: &str = "/api/v1/cocktails";

// =============================================================================
// Request Types
// =============================================================================

/// Body of `POST /api/v1/cocktails/by-filter`
#[derive(Debug, Default, Deserialize)]
pub struct ListByFilterRequest {
    #[serde(default)]
    pub ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub russian_names: Option<Vec<String>>,
    #[serde(default)]
    pub pagination: Option<Pagination>,
}

impl From<ListByFilterRequest> for CocktailFilter {
    fn from(req: ListByFilterRequest) -> Self {
        Self {
            ids: req.ids.unwrap_or_default(),
            names: req.names.unwrap_or_default(),
            russian_names: req.russian_names.unwrap_or_default(),
            pagination: req.pagination.unwrap_or_default(),
        }
    }
}

/// Query parameters of `GET /api/v1/cocktails`
#[derive(Debug, Default, PartialEq)]
pub struct ListQueryParams {
    pub page: u64,
    pub items_per_page: u64,
    pub name: Option<String>,
}

impl ListQueryParams {
    /// Parse the raw query string. Unknown keys and unparsable numbers are ignored.
    pub fn from_query_string(query: Option<&str>) -> Self {
        let mut params = Self::default();

        if let Some(q) = query {
            for pair in q.split('&') {
                if let Some((key, value)) = pair.split_once('=') {
                    let value = urlencoding::decode(&value.replace('+', " "))
                        .map(|v| v.into_owned())
                        .unwrap_or_default();
                    match key {
                        "page" => params.page = value.parse().unwrap_or(0),
                        "items_per_page" | "itemsPerPage" => {
                            params.items_per_page = value.parse().unwrap_or(0)
                        }
                        "name" if !value.trim().is_empty() => params.name = Some(value),
                        _ => {}
                    }
                }
            }
        }

        params
    }

    /// Name text searches both the primary and the localized name
    pub fn into_filter(self) -> CocktailFilter {
        let pagination = Pagination::new(self.page, self.items_per_page);
        match self.name {
            Some(name) => CocktailFilter::by_name(&name, pagination),
            None => CocktailFilter::page(pagination),
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// One cocktail as served by the API
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GetByIdResponse {
    pub id: Uuid,
    pub url: Option<String>,
    pub name: String,
    pub russian_name: String,
    pub country_of_origin: String,
    pub history: String,
    pub tags: Vec<String>,
    pub composition_elements: Vec<CocktailItem>,
    pub tools: Vec<CocktailItem>,
    pub recipe: Vec<String>,
}

impl From<Cocktail> for GetByIdResponse {
    fn from(c: Cocktail) -> Self {
        Self {
            id: c.id,
            url: c.url,
            name: c.name,
            russian_name: c.russian_name,
            country_of_origin: c.country_of_origin,
            history: c.history,
            tags: c.tags.into_iter().map(|t| t.name).collect(),
            composition_elements: c.composition_elements,
            tools: c.tools,
            recipe: c.recipe.steps,
        }
    }
}

/// Body accepted by create and update. Any `id` it carries is ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CocktailBody {
    pub url: Option<String>,
    pub name: String,
    pub russian_name: String,
    pub country_of_origin: String,
    pub history: String,
    pub tags: Vec<String>,
    pub composition_elements: Vec<CocktailItem>,
    pub tools: Vec<CocktailItem>,
    pub recipe: Vec<String>,
}

impl From<CocktailBody> for Cocktail {
    fn from(b: CocktailBody) -> Self {
        Self {
            id: Uuid::nil(),
            url: b.url,
            name: b.name,
            russian_name: b.russian_name,
            country_of_origin: b.country_of_origin,
            history: b.history,
            tags: b.tags.into_iter().map(|name| Tag { name }).collect(),
            composition_elements: b.composition_elements,
            tools: b.tools,
            recipe: Recipe { steps: b.recipe },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ListByFilterResponse {
    pub items: Vec<GetByIdResponse>,
    pub total_count: u64,
    pub page: u64,
    pub items_per_page: u64,
}

impl ListByFilterResponse {
    fn new(paged: CocktailsPaged, pagination: Pagination) -> Self {
        Self {
            items: paged.items.into_iter().map(GetByIdResponse::from).collect(),
            total_count: paged.total_count,
            page: pagination.page,
            items_per_page: pagination.items_per_page,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CreateResponse {
    pub id: Uuid,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: &'static str,
}

// =============================================================================
// Handlers
// =============================================================================

/// `GET /api/v1/cocktails/{id}`
pub async fn handle_get_by_id(catalog: &Catalog, raw_id: &str) -> Response<FullBody> {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(e) => return from_error(&e),
    };

    match catalog.fetch_by_id(id).await {
        Ok(Some(cocktail)) => json_response(StatusCode::OK, &GetByIdResponse::from(cocktail)),
        Ok(None) => from_error(&JustShakeError::NotFound(format!("cocktail {}", id))),
        Err(e) => {
            error!(%id, error = %e, "Failed to fetch cocktail");
            from_error(&e)
        }
    }
}

/// `POST /api/v1/cocktails/by-filter`
pub async fn handle_list_by_filter(catalog: &Catalog, body: &Bytes) -> Response<FullBody> {
    let request: ListByFilterRequest = if body.is_empty() {
        ListByFilterRequest::default()
    } else {
        match serde_json::from_slice(body) {
            Ok(r) => r,
            Err(e) => return from_error(&JustShakeError::from(e)),
        }
    };

    list(catalog, request.into()).await
}

/// `GET /api/v1/cocktails?page=&items_per_page=&name=`
pub async fn handle_list(catalog: &Catalog, query: Option<&str>) -> Response<FullBody> {
    list(catalog, ListQueryParams::from_query_string(query).into_filter()).await
}

async fn list(catalog: &Catalog, filter: CocktailFilter) -> Response<FullBody> {
    debug!(
        ids = filter.ids.len(),
        names = filter.names.len(),
        russian_names = filter.russian_names.len(),
        page = filter.pagination.page,
        "Listing cocktails"
    );

    let pagination = filter.pagination;
    match catalog.fetch_by_filter(&filter).await {
        Ok(paged) => json_response(
            StatusCode::OK,
            &ListByFilterResponse::new(paged, pagination),
        ),
        Err(e) => {
            error!(error = %e, "Failed to list cocktails");
            from_error(&e)
        }
    }
}

/// `POST /api/v1/cocktails`
pub async fn handle_create(catalog: &Catalog, body: &Bytes) -> Response<FullBody> {
    let cocktail: Cocktail = match serde_json::from_slice::<CocktailBody>(body) {
        Ok(b) => b.into(),
        Err(e) => return from_error(&JustShakeError::from(e)),
    };

    if cocktail.name.trim().is_empty() && cocktail.russian_name.trim().is_empty() {
        return from_error(&JustShakeError::BadRequest(
            "cocktail needs a name or a russian_name".to_string(),
        ));
    }

    match catalog.create(cocktail).await {
        Ok(id) => json_response(StatusCode::CREATED, &CreateResponse { id }),
        Err(e) => {
            error!(error = %e, "Failed to create cocktail");
            from_error(&e)
        }
    }
}

/// `PUT /api/v1/cocktails/{id}`
pub async fn handle_update(catalog: &Catalog, raw_id: &str, body: &Bytes) -> Response<FullBody> {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(e) => return from_error(&e),
    };
    let cocktail: Cocktail = match serde_json::from_slice::<CocktailBody>(body) {
        Ok(b) => b.into(),
        Err(e) => return from_error(&JustShakeError::from(e)),
    };

    match catalog.update(id, cocktail).await {
        Ok(true) => no_content(),
        Ok(false) => from_error(&JustShakeError::NotFound(format!("cocktail {}", id))),
        Err(e) => {
            error!(%id, error = %e, "Failed to update cocktail");
            from_error(&e)
        }
    }
}

/// `DELETE /api/v1/cocktails/{id}`
pub async fn handle_delete(catalog: &Catalog, raw_id: &str) -> Response<FullBody> {
    let id = match parse_id(raw_id) {
        Ok(id) => id,
        Err(e) => return from_error(&e),
    };

    match catalog.delete(id).await {
        Ok(true) => no_content(),
        Ok(false) => from_error(&JustShakeError::NotFound(format!("cocktail {}", id))),
        Err(e) => {
            error!(%id, error = %e, "Failed to delete cocktail");
            from_error(&e)
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_id(raw: &str) -> Result<Uuid, JustShakeError> {
    Uuid::parse_str(raw).map_err(|_| JustShakeError::BadRequest(format!("invalid id: {}", raw)))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<FullBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

fn no_content() -> Response<FullBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Map a crate error onto its status and JSON body
pub fn from_error(err: &JustShakeError) -> Response<FullBody> {
    json_response(
        err.status_code(),
        &ErrorResponse {
            error: err.to_string(),
            code: err.code(),
        },
    )
}
