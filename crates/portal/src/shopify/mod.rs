//! Shopify Admin API client, OAuth and app-proxy signatures.
//!
//! # Architecture
//!
//! - Admin GraphQL calls go straight to `https://{shop}/admin/api/{version}/graphql.json`
//! - The shop comes from the signed app-proxy request, so one client serves any shop
//! - The access token is the session's online OAuth token, or the offline
//!   `SHOPIFY_ACCESS_TOKEN` when no OAuth happened yet
//!
//! # Example
//!
//! ```rust,ignore
//! use culto_portal::shopify::{AdminAccess, AdminClient};
//!
//! let client = AdminClient::new(&config.shopify);
//! let access = AdminAccess { shop: "culto.myshopify.com", token: &token };
//!
//! let customer = client.customer(&access, "1234").await?;
//! let orders = client.customer_orders(&access, "1234").await?;
//! ```

mod admin;
pub mod app_proxy;
pub mod oauth;

pub use admin::{
    AdminAccess, AdminClient, Customer, CustomerUpdate, Order, OrderLine, customer_gid,
};
pub use oauth::OnlineToken;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when interacting with Shopify.
#[derive(Debug, Error)]
pub enum ShopifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// GraphQL query returned errors.
    #[error("GraphQL errors: {}", format_graphql_errors(.0))]
    GraphQL(Vec<GraphQLError>),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by Shopify.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// User error from mutation (e.g., invalid input).
    #[error("User error: {0}")]
    UserError(String),

    /// OAuth token exchange failed.
    #[error("OAuth error: {0}")]
    OAuth(String),
}

/// A GraphQL error returned by the Shopify API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQLError {
    /// Error message.
    pub message: String,
    /// Path to the error in the response.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<serde_json::Value>,
}

fn format_graphql_errors(errors: &[GraphQLError]) -> String {
    if errors.is_empty() {
        return "(no error details provided)".to_string();
    }

    errors
        .iter()
        .map(|e| {
            if e.path.is_empty() {
                e.message.clone()
            } else {
                let path = e
                    .path
                    .iter()
                    .map(|p| match p {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(".");
                format!("{} (at {path})", e.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shopify_error_display() {
        let err = ShopifyError::NotFound("Customer not found".to_string());
        assert_eq!(err.to_string(), "Not found: Customer not found");
    }

    #[test]
    fn test_graphql_error_formatting() {
        let errors = vec![
            GraphQLError {
                message: "Field not found".to_string(),
                path: vec![],
            },
            GraphQLError {
                message: "Invalid ID".to_string(),
                path: vec![serde_json::json!("customer"), serde_json::json!(0)],
            },
        ];
        let err = ShopifyError::GraphQL(errors);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: Field not found; Invalid ID (at customer.0)"
        );
    }

    #[test]
    fn test_empty_graphql_errors() {
        let err = ShopifyError::GraphQL(vec![]);
        assert_eq!(
            err.to_string(),
            "GraphQL errors: (no error details provided)"
        );
    }

    #[test]
    fn test_rate_limited_error() {
        let err = ShopifyError::RateLimited(2);
        assert_eq!(err.to_string(), "Rate limited, retry after 2 seconds");
    }
}
