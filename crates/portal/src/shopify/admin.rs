//! Shopify Admin GraphQL calls: customer profile, order history and profile updates.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use tracing::instrument;

use crate::config::ShopifyAppConfig;

use super::{GraphQLError, ShopifyError};

const CUSTOMER_QUERY: &str = r#"
query Customer($id: ID!) {
  customer(id: $id) {
    id
    firstName
    lastName
    email
    phone
    rut: metafield(namespace: "culto", key: "rut") { value }
    razonSocial: metafield(namespace: "culto", key: "razon_social") { value }
  }
}
"#;

const CUSTOMER_ORDERS_QUERY: &str = r"
query CustomerOrders($id: ID!) {
  customer(id: $id) {
    orders(first: 10, sortKey: CREATED_AT, reverse: true) {
      nodes {
        id
        name
        createdAt
        displayFulfillmentStatus
        statusPageUrl
        shippingLine { title }
        lineItems(first: 10) { nodes { title quantity } }
        fulfillments(first: 1) { trackingInfo(first: 1) { url } }
      }
    }
  }
}
";

const CUSTOMER_UPDATE_MUTATION: &str = r"
mutation CustomerUpdate($input: CustomerInput!) {
  customerUpdate(input: $input) {
    customer { id }
    userErrors { field message }
  }
}
";

/// Shop and token for one Admin API call.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess<'a> {
    /// `*.myshopify.com` domain
    pub shop: &'a str,
    /// Admin API access token
    pub token: &'a str,
}

/// A Shopify customer as the portal sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    /// Numeric customer id (the `gid://` prefix stripped)
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub rut: Option<String>,
    pub razon_social: Option<String>,
}

/// One line of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub title: String,
    pub quantity: i64,
}

/// An order from the customer's history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    /// `#1001`
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// `FULFILLED`, `UNFULFILLED`, `IN_PROGRESS`, ...
    pub fulfillment_status: String,
    pub status_page_url: Option<String>,
    pub shipping_title: Option<String>,
    pub lines: Vec<OrderLine>,
    pub tracking_url: Option<String>,
}

/// Fields for `customerUpdate`. Empty optional fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct CustomerUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub rut: String,
    pub razon_social: String,
}

impl CustomerUpdate {
    /// `CustomerInput` for the mutation.
    fn to_input(&self, customer_id: &str) -> serde_json::Value {
        let mut input = json!({
            "id": customer_gid(customer_id),
            "firstName": self.first_name,
            "lastName": self.last_name,
            "email": self.email,
        });

        if !self.phone.is_empty() {
            input["phone"] = json!(self.phone);
        }

        let metafields: Vec<serde_json::Value> = [("rut", &self.rut), ("razon_social", &self.razon_social)]
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| {
                json!({
                    "namespace": "culto",
                    "key": key,
                    "type": "single_line_text_field",
                    "value": value,
                })
            })
            .collect();
        if !metafields.is_empty() {
            input["metafields"] = json!(metafields);
        }

        input
    }
}

/// `gid://shopify/Customer/{id}`, accepting ids that already carry the prefix.
#[must_use]
pub fn customer_gid(id: &str) -> String {
    if id.starts_with("gid://") {
        id.to_string()
    } else {
        format!("gid://shopify/Customer/{id}")
    }
}

fn strip_gid(gid: &str) -> String {
    gid.rsplit('/').next().unwrap_or(gid).to_string()
}

// =============================================================================
// GraphQL response shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct MetafieldValue {
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerNode {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    rut: Option<MetafieldValue>,
    razon_social: Option<MetafieldValue>,
}

impl From<CustomerNode> for Customer {
    fn from(node: CustomerNode) -> Self {
        Self {
            id: strip_gid(&node.id),
            first_name: node.first_name.unwrap_or_default(),
            last_name: node.last_name.unwrap_or_default(),
            email: node.email,
            phone: node.phone,
            rut: node.rut.map(|m| m.value),
            razon_social: node.razon_social.map(|m| m.value),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CustomerData {
    customer: Option<CustomerNode>,
}

#[derive(Debug, Deserialize)]
struct Nodes<T> {
    nodes: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TitleNode {
    title: String,
}

#[derive(Debug, Deserialize)]
struct LineItemNode {
    title: String,
    quantity: i64,
}

#[derive(Debug, Deserialize)]
struct TrackingInfoNode {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FulfillmentNode {
    #[serde(default)]
    tracking_info: Vec<TrackingInfoNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderNode {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    display_fulfillment_status: String,
    status_page_url: Option<String>,
    shipping_line: Option<TitleNode>,
    line_items: Nodes<LineItemNode>,
    #[serde(default)]
    fulfillments: Vec<FulfillmentNode>,
}

impl From<OrderNode> for Order {
    fn from(node: OrderNode) -> Self {
        let tracking_url = node
            .fulfillments
            .into_iter()
            .flat_map(|f| f.tracking_info)
            .find_map(|t| t.url);

        Self {
            id: strip_gid(&node.id),
            name: node.name,
            created_at: node.created_at,
            fulfillment_status: node.display_fulfillment_status,
            status_page_url: node.status_page_url,
            shipping_title: node.shipping_line.map(|s| s.title),
            lines: node
                .line_items
                .nodes
                .into_iter()
                .map(|l| OrderLine {
                    title: l.title,
                    quantity: l.quantity,
                })
                .collect(),
            tracking_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OrdersCustomer {
    orders: Nodes<OrderNode>,
}

#[derive(Debug, Deserialize)]
struct OrdersData {
    customer: Option<OrdersCustomer>,
}

#[derive(Debug, Deserialize)]
struct UserErrorNode {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerUpdatePayload {
    #[serde(default)]
    user_errors: Vec<UserErrorNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CustomerUpdateData {
    customer_update: Option<CustomerUpdatePayload>,
}

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    access_token: String,
    scope: String,
    expires_in: Option<u64>,
    associated_user: Option<super::oauth::AssociatedUser>,
}

// =============================================================================
// AdminClient
// =============================================================================

/// Shopify Admin API client.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    api_version: String,
    client_id: String,
}

impl AdminClient {
    /// Create a new Admin API client.
    #[must_use]
    pub fn new(config: &ShopifyAppConfig) -> Self {
        Self {
            inner: Arc::new(AdminClientInner {
                client: reqwest::Client::new(),
                api_version: config.api_version.clone(),
                client_id: config.api_key.clone(),
            }),
        }
    }

    fn endpoint(&self, shop: &str) -> String {
        format!(
            "https://{shop}/admin/api/{}/graphql.json",
            self.inner.api_version
        )
    }

    /// Execute a GraphQL document.
    async fn execute<T: DeserializeOwned>(
        &self,
        access: &AdminAccess<'_>,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let response = self
            .inner
            .client
            .post(self.endpoint(access.shop))
            .header("X-Shopify-Access-Token", access.token)
            .header("Content-Type", "application/json")
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify Admin API returned non-success status"
            );
            return Err(ShopifyError::GraphQL(vec![GraphQLError {
                message: format!(
                    "HTTP {status}: {}",
                    response_text.chars().take(200).collect::<String>()
                ),
                path: vec![],
            }]));
        }

        let response: GraphQLResponse<T> = serde_json::from_str(&response_text)?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(errors = ?errors, "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(errors));
        }

        response.data.ok_or_else(|| {
            ShopifyError::GraphQL(vec![GraphQLError {
                message: "No data in response".to_string(),
                path: vec![],
            }])
        })
    }

    /// Fetch a customer with the Culto metafields.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::NotFound` when the customer does not exist.
    #[instrument(skip(self, access), fields(shop = %access.shop))]
    pub async fn customer(
        &self,
        access: &AdminAccess<'_>,
        customer_id: &str,
    ) -> Result<Customer, ShopifyError> {
        let data: CustomerData = self
            .execute(
                access,
                CUSTOMER_QUERY,
                json!({ "id": customer_gid(customer_id) }),
            )
            .await?;

        data.customer
            .map(Customer::from)
            .ok_or_else(|| ShopifyError::NotFound("Customer not found".to_string()))
    }

    /// The customer's last 10 orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self, access), fields(shop = %access.shop))]
    pub async fn customer_orders(
        &self,
        access: &AdminAccess<'_>,
        customer_id: &str,
    ) -> Result<Vec<Order>, ShopifyError> {
        let data: OrdersData = self
            .execute(
                access,
                CUSTOMER_ORDERS_QUERY,
                json!({ "id": customer_gid(customer_id) }),
            )
            .await?;

        Ok(data
            .customer
            .map(|c| c.orders.nodes.into_iter().map(Order::from).collect())
            .unwrap_or_default())
    }

    /// Save the "Datos" form to the customer record.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserError` with Shopify's messages when the
    /// input is rejected.
    #[instrument(skip(self, access, update), fields(shop = %access.shop))]
    pub async fn update_customer(
        &self,
        access: &AdminAccess<'_>,
        customer_id: &str,
        update: &CustomerUpdate,
    ) -> Result<(), ShopifyError> {
        let data: CustomerUpdateData = self
            .execute(
                access,
                CUSTOMER_UPDATE_MUTATION,
                json!({ "input": update.to_input(customer_id) }),
            )
            .await?;

        let errors = data
            .customer_update
            .map(|p| p.user_errors)
            .unwrap_or_default();
        if !errors.is_empty() {
            return Err(ShopifyError::UserError(
                errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            ));
        }

        Ok(())
    }

    /// Exchange an OAuth authorization code for an online access token.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::OAuth` if Shopify rejects the exchange.
    #[instrument(skip(self, client_secret, code))]
    pub async fn exchange_code(
        &self,
        shop: &str,
        client_secret: &str,
        code: &str,
    ) -> Result<super::OnlineToken, ShopifyError> {
        let url = format!("https://{shop}/admin/oauth/access_token");

        let params = [
            ("client_id", self.inner.client_id.as_str()),
            ("client_secret", client_secret),
            ("code", code),
        ];

        let response = self.inner.client.post(&url).form(&params).send().await?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ShopifyError::OAuth(format!(
                "Token exchange failed: {text}"
            )));
        }

        let token: AccessTokenResponse = response.json().await?;

        Ok(super::OnlineToken {
            access_token: token.access_token,
            scope: token.scope,
            expires_in: token.expires_in,
            associated_user: token.associated_user,
            obtained_at: Utc::now().timestamp(),
            shop: shop.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_gid() {
        assert_eq!(customer_gid("42"), "gid://shopify/Customer/42");
        assert_eq!(
            customer_gid("gid://shopify/Customer/42"),
            "gid://shopify/Customer/42"
        );
        assert_eq!(strip_gid("gid://shopify/Customer/42"), "42");
    }

    #[test]
    fn test_customer_node_conversion() {
        let body = r#"{
            "data": {
                "customer": {
                    "id": "gid://shopify/Customer/7",
                    "firstName": "Danu",
                    "lastName": null,
                    "email": "danu@culto.coffee",
                    "phone": "+59899345368",
                    "rut": {"value": "211234560019"},
                    "razonSocial": null
                }
            }
        }"#;
        let response: GraphQLResponse<CustomerData> = serde_json::from_str(body).unwrap();
        let customer = Customer::from(response.data.unwrap().customer.unwrap());
        assert_eq!(customer.id, "7");
        assert_eq!(customer.first_name, "Danu");
        assert_eq!(customer.last_name, "");
        assert_eq!(customer.rut.as_deref(), Some("211234560019"));
        assert_eq!(customer.razon_social, None);
    }

    #[test]
    fn test_order_node_conversion() {
        let body = r##"{
            "customer": {
                "orders": {
                    "nodes": [{
                        "id": "gid://shopify/Order/555",
                        "name": "#1042",
                        "createdAt": "2026-11-28T14:03:00Z",
                        "displayFulfillmentStatus": "FULFILLED",
                        "statusPageUrl": "https://culto.coffee/orders/abc",
                        "shippingLine": {"title": "Retiro en Ciudad Vieja"},
                        "lineItems": {"nodes": [{"title": "Plan Brasil", "quantity": 2}]},
                        "fulfillments": [{"trackingInfo": [{"url": "https://track.example/1"}]}]
                    }]
                }
            }
        }"##;
        let data: OrdersData = serde_json::from_str(body).unwrap();
        let order = Order::from(data.customer.unwrap().orders.nodes.into_iter().next().unwrap());
        assert_eq!(order.id, "555");
        assert_eq!(order.name, "#1042");
        assert_eq!(order.shipping_title.as_deref(), Some("Retiro en Ciudad Vieja"));
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.tracking_url.as_deref(), Some("https://track.example/1"));
    }

    #[test]
    fn test_customer_update_input() {
        let update = CustomerUpdate {
            first_name: "Ana".to_string(),
            last_name: "Pérez".to_string(),
            email: "ana@culto.coffee".to_string(),
            phone: String::new(),
            rut: "211234560019".to_string(),
            razon_social: String::new(),
        };
        let input = update.to_input("9");
        assert_eq!(input["id"], "gid://shopify/Customer/9");
        assert!(input.get("phone").is_none());
        let metafields = input["metafields"].as_array().unwrap();
        assert_eq!(metafields.len(), 1);
        assert_eq!(metafields.first().unwrap()["key"], "rut");
    }
}
