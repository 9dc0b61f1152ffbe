use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers::{self, profile};
use crate::middleware::{header_policy, CorsPolicy, RouteHeaders};
use crate::state::AppState;

/// One row of the route table
pub struct RouteEntry {
    pub name: &'static str,
    pub path: &'static str,
    pub methods: Vec<Method>,
    pub handler: MethodRouter<AppState>,
}

impl RouteEntry {
    fn new(name: &'static str, path: &'static str, method: Method, handler: MethodRouter<AppState>) -> Self {
        Self {
            name,
            path,
            methods: vec![method],
            handler,
        }
    }
}

/// API routes, most specific first. Literal segments win over captures
/// regardless of position, so `latest` never reaches the version handler.
pub fn route_table() -> Vec<RouteEntry> {
    vec![
        RouteEntry::new("install", "/install", Method::POST, post(handlers::install)),
        RouteEntry::new("list-owners", "/profile", Method::GET, get(profile::list_owners)),
        RouteEntry::new(
            "owner-version",
            "/profile/:owner/:version",
            Method::GET,
            get(profile::get_version),
        ),
        RouteEntry::new("owner-add", "/profile/:owner/add", Method::POST, post(profile::add_version)),
        RouteEntry::new(
            "owner-delete",
            "/profile/:owner/delete",
            Method::POST,
            post(profile::delete_owner),
        ),
        RouteEntry::new("owner-latest", "/profile/:owner/latest", Method::GET, get(profile::get_latest)),
        RouteEntry::new("owner", "/profile/:owner", Method::GET, get(profile::list_versions)),
    ]
}

/// Register every table entry. Each route answers undeclared methods with 404
/// and gets the header policy for its own method list.
pub fn api_router(table: &[RouteEntry], cors: &Arc<CorsPolicy>) -> Router<AppState> {
    table.iter().fold(Router::new(), |router, entry| {
        let headers = RouteHeaders::new(cors.clone(), &entry.methods);
        tracing::debug!(route = entry.name, path = entry.path, "Registering route");
        router.route(
            entry.path,
            entry
                .handler
                .clone()
                .fallback(handlers::not_found)
                .layer(middleware::from_fn_with_state(headers, header_policy)),
        )
    })
}

/// `/api/v1/` and `api/v1` both become `/api/v1`; the root prefix becomes empty
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

/// The complete application: API under the configured prefix, `/health` at the root
pub fn app(state: AppState, server: &ServerConfig) -> Router {
    let table = route_table();
    let api = api_router(&table, &state.cors);

    let prefix = normalize_prefix(&server.api_prefix);
    let router = if prefix.is_empty() {
        Router::new().merge(api)
    } else {
        Router::new().nest(&prefix, api)
    };

    router
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(server.max_request_size_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
