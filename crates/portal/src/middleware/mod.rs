//! HTTP middleware stack for the portal.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Security headers (CSP `frame-ancestors`, nosniff, no-store)
//! 5. Session layer (tower-sessions with in-memory store)
//! 6. Rate limiting (governor), per route group

pub mod portal_session;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use portal_session::Portal;
pub use rate_limit::{mutation_rate_limiter, oauth_rate_limiter};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
