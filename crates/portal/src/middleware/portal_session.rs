//! Extractor for the visitor's dashboard state.
//!
//! Handlers take a [`Portal`], mutate `portal.state` and call
//! [`Portal::save`] before responding.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::{CustomerIdentity, PortalSession, session_keys};
use crate::shopify::OnlineToken;

/// The loaded [`PortalSession`] plus the session handle to write it back.
pub struct Portal {
    session: Session,
    pub state: PortalSession,
}

impl Portal {
    /// Write the state back to the session store.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn save(&self) -> Result<(), AppError> {
        self.session.insert(session_keys::PORTAL, &self.state).await?;
        Ok(())
    }

    /// The bound customer.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Unauthorized` when the visitor never came through
    /// a signed app-proxy request.
    pub fn customer(&self) -> Result<&CustomerIdentity, AppError> {
        self.state
            .customer
            .as_ref()
            .ok_or_else(|| AppError::Unauthorized("No customer in session".to_string()))
    }

    /// The online Admin API token from the OAuth callback, if any.
    pub async fn online_token(&self) -> Option<OnlineToken> {
        self.session
            .get::<OnlineToken>(session_keys::SHOPIFY_ONLINE_TOKEN)
            .await
            .ok()
            .flatten()
    }

    /// Drop everything, including the online token.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be flushed.
    pub async fn clear(&mut self) -> Result<(), AppError> {
        self.state = PortalSession::default();
        self.session.flush().await?;
        Ok(())
    }

    /// Post/redirect/get target: the dashboard under the proxy prefix.
    #[must_use]
    pub fn home(&self) -> String {
        format!("{}/", self.state.base_path())
    }

    /// A path under the proxy prefix.
    #[must_use]
    pub fn path(&self, path: &str) -> String {
        format!("{}{path}", self.state.base_path())
    }
}

impl<S> FromRequestParts<S> for Portal
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session layer missing".to_string()))?;

        let state = match session.get::<PortalSession>(session_keys::PORTAL).await {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                // An entry from an older layout is dropped rather than failing the page
                tracing::warn!(error = %e, "Discarding unreadable portal session");
                PortalSession::default()
            }
        };

        Ok(Self { session, state })
    }
}
