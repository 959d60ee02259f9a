//! Rate limiting middleware using governor and `tower_governor`.
//!
//! - `oauth_rate_limiter`: strict limits for the OAuth install endpoints (~10/min)
//! - `mutation_rate_limiter`: relaxed limits for dashboard form posts (~120/min)

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Headers checked for the client address, in order.
///
/// Requests arrive through Shopify's app proxy (and usually a load balancer),
/// so the socket peer is never the customer.
const CLIENT_IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-forwarded-for", "x-real-ip"];

/// Key extractor that reads the client IP from proxy headers.
#[derive(Clone, Copy)]
pub struct ClientIpKeyExtractor;

/// First parseable address among the proxy headers, else the socket peer.
fn client_ip<T>(req: &Request<T>) -> Option<IpAddr> {
    let headers = req.headers();
    CLIENT_IP_HEADERS
        .iter()
        .find_map(|name| {
            headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                // X-Forwarded-For lists the original client first
                .and_then(|s| s.split(',').next())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        })
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        })
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        client_ip(req).ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create rate limiter for the OAuth endpoints: ~10 requests per minute per IP.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(6)` and `burst_size(5)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn oauth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_second(6) // Replenish 1 token every 6 seconds (~10/minute)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

/// Create rate limiter for dashboard mutations: ~120 requests per minute per IP.
///
/// Every wizard step is a form post, so bursts are generous.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_millisecond(500)` and `burst_size(30)`), which are always
/// accepted by `GovernorConfigBuilder`.
#[must_use]
pub fn mutation_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor)
        .per_millisecond(500)
        .burst_size(30)
        .finish()
        .expect("rate limiter config with per_millisecond(500) and burst_size(30) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/cancel/confirm");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_prefers_cloudflare_header() {
        let req = request(&[
            ("x-forwarded-for", "10.0.0.1"),
            ("cf-connecting-ip", "190.64.1.2"),
        ]);
        assert_eq!(client_ip(&req), Some("190.64.1.2".parse().unwrap()));
    }

    #[test]
    fn test_uses_first_forwarded_address() {
        let req = request(&[("x-forwarded-for", "190.64.1.2, 10.0.0.1")]);
        assert_eq!(client_ip(&req), Some("190.64.1.2".parse().unwrap()));
    }

    #[test]
    fn test_skips_garbage() {
        let req = request(&[("x-forwarded-for", "unknown"), ("x-real-ip", "::1")]);
        assert_eq!(client_ip(&req), Some("::1".parse().unwrap()));
        assert_eq!(client_ip(&request(&[])), None);
    }

    #[test]
    fn test_falls_back_to_socket_peer() {
        let mut req = request(&[]);
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        assert_eq!(client_ip(&req), Some("127.0.0.1".parse().unwrap()));
    }
}
