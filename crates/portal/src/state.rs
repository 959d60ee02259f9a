//! Application state shared across handlers.

use std::sync::Arc;

use secrecy::ExposeSecret;

use crate::config::PortalConfig;
use crate::culto::CultoClient;
use crate::shopify::{AdminClient, OnlineToken};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration and the two API clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    culto: CultoClient,
    admin: AdminClient,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: PortalConfig) -> Self {
        let culto = CultoClient::new(&config.culto);
        let admin = AdminClient::new(&config.shopify);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                culto,
                admin,
            }),
        }
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the Culto API client.
    #[must_use]
    pub fn culto(&self) -> &CultoClient {
        &self.inner.culto
    }

    /// Get a reference to the Shopify Admin API client.
    #[must_use]
    pub fn admin(&self) -> &AdminClient {
        &self.inner.admin
    }

    /// The app secret that signs app-proxy and OAuth requests.
    #[must_use]
    pub fn shopify_secret(&self) -> &str {
        self.inner.config.shopify.api_secret.expose_secret()
    }

    /// The offline `SHOPIFY_ACCESS_TOKEN`, if configured.
    #[must_use]
    pub fn offline_token(&self) -> Option<&str> {
        self.inner
            .config
            .shopify
            .access_token
            .as_ref()
            .map(ExposeSecret::expose_secret)
    }

    /// Admin API token for `shop`: the session's online token when it belongs
    /// to that shop and is still valid, else the offline token.
    #[must_use]
    pub fn admin_token(&self, online: Option<&OnlineToken>, shop: &str, now: i64) -> Option<String> {
        online
            .filter(|t| t.shop == shop && !t.is_expired(now))
            .map(|t| t.access_token.clone())
            .or_else(|| self.offline_token().map(str::to_string))
    }
}
