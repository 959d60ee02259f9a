//! Culto subscription portal library.
//!
//! The portal renders inside the Culto storefront through the Shopify app
//! proxy. This crate exposes the router so the binary and the integration
//! tests build the exact same application.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod culto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod shopify;
pub mod state;

use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use state::AppState;

/// Directory holding `portal.css`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the full application: routes, sessions and the middleware stack.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum::middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
