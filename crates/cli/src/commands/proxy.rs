//! Signed app-proxy URLs for exercising a local portal.
//!
//! # Environment Variables
//!
//! - `SHOPIFY_API_SECRET` - App secret that signs proxy requests
//! - `PORTAL_BASE_URL` - Where the portal listens (unless `--base-url` is given)

use chrono::Utc;
use secrecy::ExposeSecret;
use thiserror::Error;

use culto_portal::config::{ConfigError, ShopifyAppConfig};
use culto_portal::shopify::{app_proxy, oauth};

/// Errors that can occur while building a proxy URL.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Not a `*.myshopify.com` domain.
    #[error("Invalid shop domain: {0}")]
    InvalidShop(String),
}

/// `{base}/?{signed query}`
fn build_url(base_url: &str, shop: &str, customer_id: &str, timestamp: i64, secret: &str) -> String {
    format!(
        "{}/?{}",
        base_url.trim_end_matches('/'),
        app_proxy::signed_query(shop, customer_id, timestamp, secret)
    )
}

/// Print a URL that the portal accepts as a signed app-proxy request.
///
/// # Errors
///
/// Returns an error if the shop domain is invalid or the secret or base URL
/// cannot be loaded.
pub fn proxy_url(
    shop: &str,
    customer_id: &str,
    base_url: Option<&str>,
) -> Result<(), ProxyError> {
    dotenvy::dotenv().ok();

    if !oauth::is_valid_shop_domain(shop) {
        return Err(ProxyError::InvalidShop(shop.to_owned()));
    }

    let shopify = ShopifyAppConfig::from_env()?;
    let base_url = match base_url {
        Some(url) => url.to_owned(),
        None => std::env::var("PORTAL_BASE_URL")
            .map_err(|_| ProxyError::MissingEnvVar("PORTAL_BASE_URL"))?,
    };

    let url = build_url(
        &base_url,
        shop,
        customer_id,
        Utc::now().timestamp(),
        shopify.api_secret.expose_secret(),
    );

    #[allow(clippy::print_stdout)]
    {
        println!("{url}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_verifies_with_the_same_secret() {
        let secret = "proxy-test-secret-0123456789";
        let url = build_url("http://localhost:3000/", "culto.myshopify.com", "1234", 1_760_000_000, secret);
        assert!(url.starts_with("http://localhost:3000/?"));

        let query = url.split_once('?').map(|(_, q)| q).unwrap_or_default();
        let params: Vec<(String, String)> = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| {
                (
                    k.to_owned(),
                    urlencoding::decode(v).map(|v| v.into_owned()).unwrap_or_default(),
                )
            })
            .collect();
        assert!(app_proxy::verify(&params, secret));
        assert!(!app_proxy::verify(&params, "another-secret-0123456789"));
    }
}
