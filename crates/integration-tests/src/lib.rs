//! Integration tests for the Culto subscription portal.
//!
//! The router tests drive `culto_portal::app` in-process with
//! `tower::ServiceExt::oneshot`; nothing listens on a socket and the
//! upstream clients point at a closed local port.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process router tests
//! cargo test -p culto-portal-integration-tests
//!
//! # Live Culto API tests (needs CULTO_API_BASE_URL and CULTO_API_TOKEN)
//! cargo test -p culto-portal-integration-tests -- --ignored
//! ```

use axum::body::Body;
use axum::http::{Request, Response, header};
use secrecy::SecretString;

use culto_portal::config::{CultoApiConfig, PortalConfig, ShopifyAppConfig};
use culto_portal::middleware::session::SESSION_COOKIE_NAME;
use culto_portal::state::AppState;

/// Shopify API secret the test state signs with.
pub const TEST_SECRET: &str = "integration-secret";

/// Shop domain used in signed proxy requests.
pub const TEST_SHOP: &str = "culto-test.myshopify.com";

/// Client address sent in `X-Forwarded-For` so the rate limiter has a key.
pub const TEST_CLIENT_IP: &str = "203.0.113.7";

/// Portal configuration that never touches the environment.
///
/// There is no offline Admin API token, so customer lookups fail fast
/// instead of reaching Shopify.
#[must_use]
pub fn test_config(debug_tools: bool) -> PortalConfig {
    PortalConfig {
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 3000,
        base_url: "http://localhost:3000".to_string(),
        shopify: ShopifyAppConfig {
            api_key: "integration_api_key".to_string(),
            api_secret: SecretString::from(TEST_SECRET),
            scopes: "read_customers,write_customers,read_orders".to_string(),
            api_version: "2024-01".to_string(),
            access_token: None,
        },
        culto: CultoApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_token: SecretString::from("culto_integration_token"),
        },
        debug_tools,
        help_url: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
        log_json: false,
    }
}

/// A fresh application with its own session store.
#[must_use]
pub fn test_app(debug_tools: bool) -> axum::Router {
    culto_portal::app(AppState::new(test_config(debug_tools)))
}

/// `GET` request with a client address.
///
/// # Panics
///
/// Panics if `uri` is not a valid request target.
#[must_use]
#[allow(clippy::expect_used)]
pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri).header("x-forwarded-for", TEST_CLIENT_IP);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("valid request")
}

/// Form `POST` request with a client address.
///
/// # Panics
///
/// Panics if `uri` is not a valid request target.
#[must_use]
#[allow(clippy::expect_used)]
pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri)
        .header("x-forwarded-for", TEST_CLIENT_IP)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).expect("valid request")
}

/// The `name=value` pair of the session cookie set on a response.
#[must_use]
pub fn session_cookie<B>(response: &Response<B>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE_NAME}=")))
        .map(str::to_owned)
}
