//! JSON customer lookup for storefront scripts.

use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_sessions::Session;

use crate::models::session_keys;
use crate::shopify::{AdminAccess, Customer, OnlineToken, ShopifyError, customer_gid};
use crate::state::AppState;

const CORS_HEADERS: [(HeaderName, HeaderValue); 3] = [
    (
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    ),
    (
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, OPTIONS"),
    ),
    (
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    ),
];

#[derive(Debug, Deserialize)]
pub struct CustomerSessionQuery {
    pub shop: Option<String>,
    pub customer_id: Option<String>,
}

/// The customer as storefront scripts see it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPayload {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl From<Customer> for CustomerPayload {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer_gid(&customer.id),
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone: customer.phone,
        }
    }
}

fn reply(status: StatusCode, body: serde_json::Value) -> Response {
    (status, CORS_HEADERS, Json(body)).into_response()
}

fn error_reply(status: StatusCode, message: &str) -> Response {
    reply(status, json!({ "error": message }))
}

/// Look up a customer by id.
///
/// # Route
///
/// `GET /api/customer-session?shop=&customer_id=`
pub async fn customer_session(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CustomerSessionQuery>,
) -> Response {
    let Some(shop) = query.shop.filter(|s| !s.is_empty()) else {
        return error_reply(StatusCode::BAD_REQUEST, "Missing shop parameter");
    };
    let Some(customer_id) = query.customer_id.filter(|s| !s.is_empty()) else {
        return error_reply(StatusCode::BAD_REQUEST, "Missing customer_id parameter");
    };

    let online: Option<OnlineToken> = session
        .get(session_keys::SHOPIFY_ONLINE_TOKEN)
        .await
        .ok()
        .flatten();
    let Some(token) = state.admin_token(online.as_ref(), &shop, Utc::now().timestamp()) else {
        tracing::error!(shop = %shop, "No Admin API token for customer lookup");
        return error_reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Missing Shopify access token",
        );
    };
    let access = AdminAccess {
        shop: &shop,
        token: &token,
    };

    match state.admin().customer(&access, &customer_id).await {
        Ok(customer) => reply(
            StatusCode::OK,
            json!({ "customer": CustomerPayload::from(customer) }),
        ),
        Err(ShopifyError::NotFound(_)) => {
            error_reply(StatusCode::NOT_FOUND, "Customer not found")
        }
        Err(ShopifyError::GraphQL(errors)) => {
            tracing::warn!(customer_id = %customer_id, errors = ?errors, "Customer lookup failed");
            reply(
                StatusCode::BAD_REQUEST,
                json!({ "error": "GraphQL errors", "details": errors }),
            )
        }
        Err(e) => {
            tracing::error!(customer_id = %customer_id, "Customer lookup failed: {}", e);
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

/// CORS preflight.
pub async fn preflight() -> Response {
    (StatusCode::OK, CORS_HEADERS).into_response()
}
