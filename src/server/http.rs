//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Routing is a plain
//! match over method and path.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::config::Args;
use crate::routes::{self, COCKTAILS_PATH};
use crate::services::Catalog;
use crate::session::InMemorySessionCache;
use crate::types::JustShakeError;

type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Which catalog store backs the running process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mongo => "mongodb",
            Self::Memory => "memory",
        }
    }
}

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub catalog: Catalog,
    /// Bot conversation state, reported on /health
    pub sessions: Arc<InMemorySessionCache>,
    pub storage: StorageBackend,
    pub bot_enabled: bool,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        args: Args,
        catalog: Catalog,
        sessions: Arc<InMemorySessionCache>,
        storage: StorageBackend,
    ) -> Self {
        Self {
            args,
            catalog,
            sessions,
            storage,
            bot_enabled: false,
            started_at: Instant::now(),
        }
    }

    /// State over an empty in-memory catalog
    #[cfg(test)]
    pub fn in_memory(args: Args) -> Self {
        let catalog = Catalog::new(
            Arc::new(crate::db::InMemoryCatalogStore::new()),
            args.request_timeout(),
        );
        Self::new(
            args,
            catalog,
            Arc::new(InMemorySessionCache::new()),
            StorageBackend::Memory,
        )
    }

    #[cfg(test)]
    pub fn with_storage(mut self, storage: StorageBackend) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_bot(mut self, enabled: bool) -> Self {
        self.bot_enabled = enabled;
        self
    }
}

/// Run the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<(), JustShakeError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "JustShake listening on {} (storage: {})",
        state.args.listen,
        state.storage.as_str()
    );

    if state.args.dev_mode {
        warn!("Development mode enabled - in-memory fallback allowed");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
                // Back off briefly so fd exhaustion does not spin the loop
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}

/// Cocktail API paths below `/api/v1/cocktails`
#[derive(Debug, PartialEq, Eq)]
enum CocktailRoute<'a> {
    Collection,
    ByFilter,
    Item(&'a str),
}

fn match_cocktail_route(path: &str) -> Option<CocktailRoute<'_>> {
    let rest = path.strip_prefix(COCKTAILS_PATH)?;
    match rest.trim_end_matches('/') {
        "" => Some(CocktailRoute::Collection),
        "/by-filter" => Some(CocktailRoute::ByFilter),
        item => {
            let id = item.strip_prefix('/')?;
            if id.is_empty() || id.contains('/') {
                None
            } else {
                Some(CocktailRoute::Item(id))
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);

    debug!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(to_boxed(preflight_response()));
    }

    match (&method, path.as_str()) {
        (&Method::GET, "/health" | "/healthz") => {
            return Ok(to_boxed(routes::health_check(Arc::clone(&state))));
        }
        (&Method::GET, "/ready" | "/readyz") => {
            return Ok(to_boxed(routes::readiness_check(Arc::clone(&state))));
        }
        (&Method::GET, "/version") => {
            return Ok(to_boxed(routes::version_info()));
        }
        _ => {}
    }

    let Some(route) = match_cocktail_route(&path) else {
        return Ok(to_boxed(not_found_response(&path)));
    };

    let catalog = &state.catalog;
    let response = match (method, route) {
        (Method::GET, CocktailRoute::Collection) => {
            routes::handle_list(catalog, query.as_deref()).await
        }
        (Method::POST, CocktailRoute::Collection) => match read_body(req).await {
            Ok(body) => routes::handle_create(catalog, &body).await,
            Err(resp) => resp,
        },
        (Method::POST, CocktailRoute::ByFilter) => match read_body(req).await {
            Ok(body) => routes::handle_list_by_filter(catalog, &body).await,
            Err(resp) => resp,
        },
        (Method::GET, CocktailRoute::Item(id)) => routes::handle_get_by_id(catalog, id).await,
        (Method::PUT, CocktailRoute::Item(id)) => match read_body(req).await {
            Ok(body) => routes::handle_update(catalog, id, &body).await,
            Err(resp) => resp,
        },
        (Method::DELETE, CocktailRoute::Item(id)) => routes::handle_delete(catalog, id).await,
        (method, _) => method_not_allowed_response(&method, &path),
    };

    Ok(to_boxed(response))
}

async fn read_body(req: Request<Incoming>) -> Result<Bytes, Response<Full<Bytes>>> {
    match req.into_body().collect().await {
        Ok(b) => Ok(b.to_bytes()),
        Err(_) => Err(bad_request_response("Invalid body")),
    }
}

fn to_boxed(response: Response<Full<Bytes>>) -> Response<BoxBody> {
    response.map(|body| body.map_err(|never| match never {}).boxed())
}

/// CORS preflight response
fn preflight_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Headers", "*")
        .header(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        )
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Not found response
fn not_found_response(path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Not Found",
        "path": path,
    });

    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

/// Bad request response
fn bad_request_response(message: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Bad Request",
        "message": message
    });

    Response::builder()
        .status(StatusCode::BAD_REQUEST)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

fn method_not_allowed_response(method: &Method, path: &str) -> Response<Full<Bytes>> {
    let body = serde_json::json!({
        "error": "Method Not Allowed",
        "method": method.as_str(),
        "path": path,
    });

    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}
