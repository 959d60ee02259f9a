//! Shopify app-proxy request signatures.
//!
//! Shopify forwards storefront requests under the proxy prefix and appends
//! `shop`, `logged_in_customer_id`, `path_prefix`, `timestamp` and
//! `signature`. The signature is a hex HMAC-SHA256 over the remaining
//! parameters sorted by key and written as `key=value` with no separator;
//! repeated keys are joined with `,`.

use std::collections::BTreeMap;

use super::oauth;

/// The proxy parameters the portal acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRequest {
    pub shop: String,
    /// Empty when the storefront visitor is not logged in.
    pub logged_in_customer_id: Option<String>,
    pub path_prefix: Option<String>,
    pub timestamp: Option<String>,
}

impl ProxyRequest {
    /// Pull the proxy parameters out of a query, if it carries a signature.
    #[must_use]
    pub fn from_params(params: &[(String, String)]) -> Option<Self> {
        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        get("signature")?;
        Some(Self {
            shop: get("shop")?,
            logged_in_customer_id: get("logged_in_customer_id").filter(|id| !id.is_empty()),
            path_prefix: get("path_prefix"),
            timestamp: get("timestamp"),
        })
    }
}

/// The string Shopify signs for app-proxy requests.
#[must_use]
pub fn signature_message(params: &[(String, String)]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (key, value) in params {
        if key != "signature" {
            grouped.entry(key.as_str()).or_default().push(value.as_str());
        }
    }

    grouped
        .into_iter()
        .map(|(key, values)| format!("{key}={}", values.join(",")))
        .collect()
}

/// Hex signature for a set of proxy parameters.
#[must_use]
pub fn sign(params: &[(String, String)], secret: &str) -> String {
    oauth::sign(&signature_message(params), secret)
}

/// Verify the `signature` parameter.
#[must_use]
pub fn verify(params: &[(String, String)], secret: &str) -> bool {
    let Some((_, provided)) = params.iter().find(|(k, _)| k == "signature") else {
        return false;
    };
    oauth::verify_hex(&signature_message(params), provided, secret)
}

/// A signed proxy query string, for exercising the portal locally.
#[must_use]
pub fn signed_query(shop: &str, customer_id: &str, timestamp: i64, secret: &str) -> String {
    let mut params = vec![
        ("shop".to_string(), shop.to_string()),
        ("logged_in_customer_id".to_string(), customer_id.to_string()),
        ("path_prefix".to_string(), "/apps/suscripcion".to_string()),
        ("timestamp".to_string(), timestamp.to_string()),
    ];
    let signature = sign(&params, secret);
    params.push(("signature".to_string(), signature));

    params
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    /// Reference request from Shopify's app-proxy documentation (secret `hush`).
    fn reference() -> Vec<(String, String)> {
        pairs(&[
            ("extra", "1"),
            ("extra", "2"),
            ("shop", "shop-name.myshopify.com"),
            ("logged_in_customer_id", "1"),
            ("path_prefix", "/apps/awesome_reviews"),
            ("timestamp", "1317327555"),
            (
                "signature",
                "a9718877bea71c2484f91608a7eaea1532bdf71f5c56825065fa4ccabe549ef3",
            ),
        ])
    }

    #[test]
    fn test_signature_message() {
        assert_eq!(
            signature_message(&reference()),
            "extra=1,2logged_in_customer_id=1path_prefix=/apps/awesome_reviewsshop=shop-name.myshopify.comtimestamp=1317327555"
        );
    }

    #[test]
    fn test_verify_reference_vector() {
        assert!(verify(&reference(), "hush"));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        assert!(!verify(&reference(), "not-hush"));

        let mut params = reference();
        if let Some(id) = params.iter_mut().find(|(k, _)| k == "logged_in_customer_id") {
            id.1 = "2".to_string();
        }
        assert!(!verify(&params, "hush"));

        let unsigned: Vec<_> = reference()
            .into_iter()
            .filter(|(k, _)| k != "signature")
            .collect();
        assert!(!verify(&unsigned, "hush"));
    }

    #[test]
    fn test_from_params() {
        let request = ProxyRequest::from_params(&reference()).unwrap();
        assert_eq!(request.shop, "shop-name.myshopify.com");
        assert_eq!(request.logged_in_customer_id.as_deref(), Some("1"));

        let anonymous = pairs(&[
            ("shop", "shop-name.myshopify.com"),
            ("logged_in_customer_id", ""),
            ("signature", "00"),
        ]);
        assert_eq!(
            ProxyRequest::from_params(&anonymous)
                .unwrap()
                .logged_in_customer_id,
            None
        );

        assert!(ProxyRequest::from_params(&pairs(&[("shop", "x.myshopify.com")])).is_none());
    }

    #[test]
    fn test_signed_query_round_trips() {
        let query = signed_query("culto.myshopify.com", "42", 1_790_000_000, "hush");
        let params: Vec<(String, String)> = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.to_string(), urlencoding::decode(v).unwrap().into_owned()))
            .collect();
        assert!(verify(&params, "hush"));
    }
}
