//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The portal renders inside
//! the storefront through the app proxy, so under HTTPS the cookie is
//! `SameSite=None; Secure`.

use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::PortalConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "culto_portal_session";

/// Session expiry time in seconds (1 day of inactivity).
const SESSION_EXPIRY_SECONDS: i64 = 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &PortalConfig) -> SessionManagerLayer<MemoryStore> {
    let is_secure = config.is_secure();

    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(same_site(is_secure))
        .with_http_only(true)
        .with_path("/")
}

/// `None` needs `Secure`; plain HTTP development falls back to `Lax`.
const fn same_site(is_secure: bool) -> SameSite {
    if is_secure { SameSite::None } else { SameSite::Lax }
}
