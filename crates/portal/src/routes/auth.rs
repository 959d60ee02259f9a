//! Shopify OAuth (online access mode) and logout.
//!
//! - Begin: validates the shop, stores a CSRF state and redirects to Shopify
//! - Callback: checks the HMAC and state, exchanges the code and stores the
//!   online token in the session
//! - Logout: drops the session and sends the visitor to the storefront logout

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use rand::Rng;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{Result, clear_sentry_user};
use crate::middleware::Portal;
use crate::models::session_keys;
use crate::shopify::oauth;
use crate::state::AppState;

/// Query parameters for `GET /api/auth`.
#[derive(Debug, Deserialize)]
pub struct BeginQuery {
    pub shop: Option<String>,
}

const STATE_LENGTH: usize = 32;

/// Random alphanumeric nonce for the OAuth `state` parameter.
fn random_state(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::rng();
    (0..length)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect()
}

fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
        .filter(|v| !v.is_empty())
}

fn redirect_uri(state: &AppState) -> String {
    format!(
        "{}/api/auth/callback",
        state.config().base_url.trim_end_matches('/')
    )
}

/// Start the OAuth flow for a shop.
///
/// # Route
///
/// `GET /api/auth?shop=`
pub async fn begin(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<BeginQuery>,
) -> Response {
    let Some(shop) = query.shop.filter(|s| !s.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing shop parameter").into_response();
    };
    if !oauth::is_valid_shop_domain(&shop) {
        tracing::warn!(shop = %shop, "Rejected OAuth begin for invalid shop");
        return (StatusCode::BAD_REQUEST, "Invalid shop parameter").into_response();
    }

    let oauth_state = random_state(STATE_LENGTH);
    if let Err(e) = session
        .insert(session_keys::SHOPIFY_OAUTH_STATE, &oauth_state)
        .await
    {
        tracing::error!("Failed to store OAuth state in session: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response();
    }

    let shopify = &state.config().shopify;
    let url = oauth::authorization_url(
        &shop,
        &shopify.api_key,
        &shopify.scopes,
        &redirect_uri(&state),
        &oauth_state,
    );
    Redirect::to(&url).into_response()
}

/// Handle the OAuth callback.
///
/// # Route
///
/// `GET /api/auth/callback`
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    if let Some(error) = param(&params, "error") {
        tracing::warn!(error, "Shopify OAuth error");
        return (StatusCode::BAD_REQUEST, "Authentication denied").into_response();
    }

    if !oauth::verify_callback_hmac(&params, state.shopify_secret()) {
        tracing::warn!("Shopify OAuth callback with invalid HMAC");
        return (StatusCode::BAD_REQUEST, "Invalid HMAC").into_response();
    }

    let stored_state: Option<String> = session
        .get(session_keys::SHOPIFY_OAUTH_STATE)
        .await
        .ok()
        .flatten();
    if stored_state.is_none() || stored_state.as_deref() != param(&params, "state") {
        tracing::warn!("Shopify OAuth state mismatch");
        return (StatusCode::BAD_REQUEST, "Invalid state").into_response();
    }
    if let Err(e) = session
        .remove::<String>(session_keys::SHOPIFY_OAUTH_STATE)
        .await
    {
        tracing::warn!("Failed to clear OAuth state from session: {}", e);
    }

    let (Some(shop), Some(code)) = (param(&params, "shop"), param(&params, "code")) else {
        return (StatusCode::BAD_REQUEST, "Missing shop or code").into_response();
    };
    if !oauth::is_valid_shop_domain(shop) {
        return (StatusCode::BAD_REQUEST, "Invalid shop parameter").into_response();
    }

    let token = match state
        .admin()
        .exchange_code(shop, state.shopify_secret(), code)
        .await
    {
        Ok(token) => token,
        Err(e) => {
            tracing::error!(shop, "Failed to exchange Shopify OAuth code: {}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response();
        }
    };

    if let Err(e) = session
        .insert(session_keys::SHOPIFY_ONLINE_TOKEN, &token)
        .await
    {
        tracing::error!("Failed to store Shopify online token: {}", e);
        return (StatusCode::INTERNAL_SERVER_ERROR, "Authentication failed").into_response();
    }

    tracing::info!(shop, "Shopify OAuth completed");

    let host = param(&params, "host").unwrap_or_default();
    Redirect::to(&format!(
        "/?shop={}&host={}",
        urlencoding::encode(shop),
        urlencoding::encode(host)
    ))
    .into_response()
}

/// "Cerrar sesión".
///
/// # Route
///
/// `POST /logout`
pub async fn logout(mut portal: Portal) -> Result<Redirect> {
    let shop = portal.state.customer.as_ref().map(|c| c.shop.clone());
    if let Some(customer) = portal.state.customer.as_ref() {
        tracing::info!(customer_id = %customer.id, "Customer logged out");
    }

    portal.clear().await?;
    clear_sentry_user();

    Ok(match shop {
        Some(shop) => Redirect::to(&format!("https://{shop}/account/logout")),
        None => Redirect::to("/"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_state_is_alphanumeric() {
        let state = random_state(STATE_LENGTH);
        assert_eq!(state.len(), STATE_LENGTH);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(state, random_state(STATE_LENGTH));
    }

    #[test]
    fn test_param_skips_empty_values() {
        let params = vec![
            ("shop".to_string(), "culto.myshopify.com".to_string()),
            ("host".to_string(), String::new()),
        ];
        assert_eq!(param(&params, "shop"), Some("culto.myshopify.com"));
        assert_eq!(param(&params, "host"), None);
        assert_eq!(param(&params, "code"), None);
    }
}
