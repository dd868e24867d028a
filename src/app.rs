use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::{get, post},
    Router,
};
use chrono::Duration;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::TokenService;
use crate::config::{AppConfig, CollectionNames};
use crate::database::DocumentStore;
use crate::handlers::{protected, public};
use crate::middleware::jwt_cookie_middleware;

/// Shared request context. The store handle is created once at startup and
/// injected here; handlers never reach for globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub tokens: TokenService,
    pub collections: CollectionNames,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: &AppConfig) -> Self {
        Self {
            store,
            tokens: TokenService::new(
                &config.security.token_secret,
                Duration::seconds(config.security.token_ttl_secs),
            ),
            collections: config.store.collections.clone(),
            cookie_secure: config.security.cookie_secure,
        }
    }
}

/// Full router without CORS, for callers that configure origins themselves
pub fn router(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .merge(session_routes())
        .merge(catalog_routes())
        .merge(booking_routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Router with the credentialed CORS policy for the configured origins
pub fn app(state: AppState, cors_origins: &[String]) -> Router {
    router(state).layer(cors_layer(cors_origins))
}

fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/jwt", post(public::session::issue))
        .route("/logout", post(public::session::logout))
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/services", get(public::services::list))
        .route("/services/title", get(public::services::titles))
        .route("/services/:id", get(public::services::get))
        .route("/products", get(public::products::list))
}

fn booking_routes(state: AppState) -> Router<AppState> {
    use axum::routing::patch;

    Router::new()
        // Only the listing is token-gated; the layer is attached before
        // `.post` so creation stays public
        .route(
            "/bookings",
            get(protected::bookings::list)
                .route_layer(middleware::from_fn_with_state(state, jwt_cookie_middleware))
                .post(public::bookings::create),
        )
        .route(
            "/bookings/:id",
            patch(public::bookings::update_status).delete(public::bookings::delete),
        )
}

/// Cookies only cross origins when credentials are allowed, which in turn
/// rules out wildcard origins
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
