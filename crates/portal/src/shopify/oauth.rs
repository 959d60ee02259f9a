//! Shopify OAuth in online access mode.
//!
//! `GET /api/auth` redirects the merchant to the authorize URL with
//! `grant_options[]=per-user`; Shopify comes back to `/api/auth/callback`
//! with a signed query that carries the authorization code.

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// An online (per-user) Admin API token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnlineToken {
    /// The access token for API calls
    pub access_token: String,
    /// Granted scopes
    pub scope: String,
    /// Seconds until the token expires
    pub expires_in: Option<u64>,
    /// Staff member the token acts for
    pub associated_user: Option<AssociatedUser>,
    /// Unix timestamp when token was obtained
    pub obtained_at: i64,
    /// Associated shop domain
    pub shop: String,
}

impl OnlineToken {
    /// Whether the token is past its lifetime at `now` (unix seconds).
    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_in.is_some_and(|ttl| {
            i64::try_from(ttl).is_ok_and(|ttl| now >= self.obtained_at.saturating_add(ttl))
        })
    }
}

/// The staff member an online token belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssociatedUser {
    pub id: u64,
    #[serde(default)]
    pub email: Option<String>,
}

/// Whether `shop` is a bare `*.myshopify.com` domain.
#[must_use]
pub fn is_valid_shop_domain(shop: &str) -> bool {
    shop.strip_suffix(".myshopify.com").is_some_and(|name| {
        !name.is_empty()
            && !name.starts_with('-')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
    })
}

/// Build the OAuth authorization URL for online access.
#[must_use]
pub fn authorization_url(
    shop: &str,
    client_id: &str,
    scopes: &str,
    redirect_uri: &str,
    state: &str,
) -> String {
    format!(
        "https://{shop}/admin/oauth/authorize?client_id={}&scope={}&redirect_uri={}&state={}&grant_options%5B%5D=per-user",
        urlencoding::encode(client_id),
        urlencoding::encode(scopes),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(state)
    )
}

/// The string Shopify signs for OAuth callbacks: every parameter except
/// `hmac` and `signature`, sorted by key, as `key=value` joined by `&`.
#[must_use]
pub fn hmac_message(params: &[(String, String)]) -> String {
    let mut pairs: Vec<&(String, String)> = params
        .iter()
        .filter(|(k, _)| k != "hmac" && k != "signature")
        .collect();

    // Sort alphabetically by key
    pairs.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex HMAC-SHA256 of `message` under `secret`.
#[must_use]
pub fn sign(message: &str, secret: &str) -> String {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return String::new();
    };
    mac.update(message.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time check of a hex HMAC over `message`.
#[must_use]
pub fn verify_hex(message: &str, provided: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(provided) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(message.as_bytes());
    mac.verify_slice(&expected).is_ok()
}

/// Verify the `hmac` parameter of an OAuth callback query.
#[must_use]
pub fn verify_callback_hmac(params: &[(String, String)], secret: &str) -> bool {
    let Some((_, provided)) = params.iter().find(|(k, _)| k == "hmac") else {
        return false;
    };
    verify_hex(&hmac_message(params), provided, secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    fn callback_params() -> Vec<(String, String)> {
        pairs(&[
            ("shop", "culto-test.myshopify.com"),
            ("code", "0907a61c0c8d55e99db179b68161bc00"),
            ("timestamp", "1337178173"),
            ("state", "0.6784241404160823"),
            ("host", "Y3VsdG8tdGVzdC5teXNob3BpZnkuY29tL2FkbWlu"),
        ])
    }

    #[test]
    fn test_hmac_message_sorts_and_skips_signature() {
        let mut params = callback_params();
        params.push(("hmac".to_string(), "ignored".to_string()));
        assert_eq!(
            hmac_message(&params),
            "code=0907a61c0c8d55e99db179b68161bc00&host=Y3VsdG8tdGVzdC5teXNob3BpZnkuY29tL2FkbWlu&shop=culto-test.myshopify.com&state=0.6784241404160823&timestamp=1337178173"
        );
    }

    #[test]
    fn test_verify_accepts_signed_callback() {
        let mut params = callback_params();
        let hmac = sign(&hmac_message(&params), "hush");
        params.push(("hmac".to_string(), hmac));
        assert!(verify_callback_hmac(&params, "hush"));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let mut params = callback_params();
        let hmac = sign(&hmac_message(&params), "hush");
        params.push(("hmac".to_string(), hmac));

        assert!(!verify_callback_hmac(&params, "other-secret"));

        if let Some(shop) = params.iter_mut().find(|(k, _)| k == "shop") {
            shop.1 = "evil.myshopify.com".to_string();
        }
        assert!(!verify_callback_hmac(&params, "hush"));
    }

    #[test]
    fn test_verify_rejects_missing_or_malformed_hmac() {
        assert!(!verify_callback_hmac(&callback_params(), "hush"));

        let mut params = callback_params();
        params.push(("hmac".to_string(), "not-hex".to_string()));
        assert!(!verify_callback_hmac(&params, "hush"));
    }

    #[test]
    fn test_shop_domain_validation() {
        assert!(is_valid_shop_domain("culto.myshopify.com"));
        assert!(is_valid_shop_domain("culto-cafe-2.myshopify.com"));
        assert!(!is_valid_shop_domain("myshopify.com"));
        assert!(!is_valid_shop_domain(".myshopify.com"));
        assert!(!is_valid_shop_domain("culto.coffee"));
        assert!(!is_valid_shop_domain("evil.com/.myshopify.com"));
        assert!(!is_valid_shop_domain("a.b.myshopify.com"));
    }

    #[test]
    fn test_authorization_url_requests_online_token() {
        let url = authorization_url(
            "culto.myshopify.com",
            "key123",
            "read_customers,read_orders",
            "https://portal.culto.coffee/api/auth/callback",
            "nonce",
        );
        assert!(url.starts_with("https://culto.myshopify.com/admin/oauth/authorize?client_id=key123"));
        assert!(url.contains("scope=read_customers%2Cread_orders"));
        assert!(url.contains("redirect_uri=https%3A%2F%2Fportal.culto.coffee%2Fapi%2Fauth%2Fcallback"));
        assert!(url.ends_with("grant_options%5B%5D=per-user"));
    }

    #[test]
    fn test_token_expiry() {
        let token = OnlineToken {
            access_token: "shpua_x".to_string(),
            scope: "read_customers".to_string(),
            expires_in: Some(86_399),
            associated_user: None,
            obtained_at: 1_000,
            shop: "culto.myshopify.com".to_string(),
        };
        assert!(!token.is_expired(1_000));
        assert!(token.is_expired(1_000 + 86_399));
    }
}
