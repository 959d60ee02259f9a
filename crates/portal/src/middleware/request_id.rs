//! Request id for log and Sentry correlation.
//!
//! Shopify's app proxy does not forward one, so an id is minted unless an
//! upstream proxy already set `x-request-id`. Handler logs run inside a
//! `portal_request` span carrying the id, and the id is echoed back.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Instrument;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream id that is trusted as is.
const MAX_UPSTREAM_ID_LEN: usize = 128;

fn upstream_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_UPSTREAM_ID_LEN)
        .map(String::from)
}

/// Tag the request with an id and run it inside a span that carries it.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = upstream_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let span = tracing::info_span!(
        "portal_request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(id: &str) -> Request {
        Request::get("/")
            .header(REQUEST_ID_HEADER, id)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_upstream_id_is_trimmed() {
        assert_eq!(upstream_id(&request_with(" abc-123 ")).as_deref(), Some("abc-123"));
    }

    #[test]
    fn test_oversized_upstream_id_is_replaced() {
        assert_eq!(upstream_id(&request_with(&"x".repeat(200))), None);
        assert_eq!(upstream_id(&request_with("")), None);
    }
}
