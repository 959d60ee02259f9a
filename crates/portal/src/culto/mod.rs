//! Culto subscription API client.
//!
//! # Endpoints
//!
//! ```text
//! GET   /subscriptions?email=   - Customer subscriptions ({ "data": [...] })
//! GET   /prices                 - Price catalog ({ "data": [...] })
//! PATCH /subscriptions/{id}     - Partial subscription update
//! POST  /coupons/apply          - Apply a retention/reactivation coupon
//! ```
//!
//! Every call sends `Authorization: Bearer <token>`. Prices are cached for
//! five minutes; subscriptions are always fetched fresh.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, instrument};

use culto_portal_core::{FlowType, Price, Subscription, SubscriptionUpdate};

use crate::config::CultoApiConfig;

const PRICES_CACHE_KEY: &str = "prices";

/// Errors from the Culto API.
#[derive(Debug, Error)]
pub enum CultoError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("{context} ({status}): {body}")]
    Api {
        status: u16,
        context: &'static str,
        body: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// `{ "data": ... }` wrapper used by the list endpoints.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct ApplyCouponRequest<'a> {
    email: &'a str,
    flow_type: FlowType,
}

/// Client for the Culto REST API.
#[derive(Clone)]
pub struct CultoClient {
    inner: Arc<CultoClientInner>,
}

struct CultoClientInner {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
    prices: Cache<&'static str, Arc<Vec<Price>>>,
}

impl CultoClient {
    /// Create a new Culto API client.
    #[must_use]
    pub fn new(config: &CultoApiConfig) -> Self {
        let prices = Cache::builder()
            .max_capacity(1)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(CultoClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                api_token: config.api_token.expose_secret().to_string(),
                prices,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }

    /// Check the status and decode the body.
    async fn read<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &'static str,
    ) -> Result<T, CultoError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "{context}"
            );
            return Err(CultoError::Api {
                status: status.as_u16(),
                context,
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// All subscriptions of a customer.
    ///
    /// # Errors
    ///
    /// Returns `CultoError::Api` ("Failed to fetch subscriptions") on non-2xx.
    #[instrument(skip(self))]
    pub async fn subscriptions(&self, email: &str) -> Result<Vec<Subscription>, CultoError> {
        let path = format!("/subscriptions?email={}", urlencoding::encode(email));
        let response = self
            .inner
            .client
            .get(self.url(&path))
            .bearer_auth(&self.inner.api_token)
            .send()
            .await?;

        let envelope: DataEnvelope<Vec<Subscription>> =
            Self::read(response, "Failed to fetch subscriptions").await?;
        debug!(count = envelope.data.len(), "Fetched subscriptions");
        Ok(envelope.data)
    }

    /// The price catalog, cached for five minutes.
    ///
    /// # Errors
    ///
    /// Returns `CultoError::Api` ("Failed to fetch prices") on non-2xx.
    #[instrument(skip(self))]
    pub async fn prices(&self) -> Result<Arc<Vec<Price>>, CultoError> {
        if let Some(prices) = self.inner.prices.get(PRICES_CACHE_KEY).await {
            debug!("Cache hit for prices");
            return Ok(prices);
        }

        let response = self
            .inner
            .client
            .get(self.url("/prices"))
            .bearer_auth(&self.inner.api_token)
            .send()
            .await?;

        let envelope: DataEnvelope<Vec<Price>> =
            Self::read(response, "Failed to fetch prices").await?;
        let prices = Arc::new(envelope.data);

        self.inner
            .prices
            .insert(PRICES_CACHE_KEY, Arc::clone(&prices))
            .await;

        Ok(prices)
    }

    /// PATCH a subscription.
    ///
    /// # Errors
    ///
    /// Returns `CultoError::Api` ("Failed to update subscription") on non-2xx.
    #[instrument(skip(self, update), fields(subscription_id = %id))]
    pub async fn update_subscription(
        &self,
        id: &str,
        update: &SubscriptionUpdate,
    ) -> Result<Subscription, CultoError> {
        let path = format!("/subscriptions/{}", urlencoding::encode(id));
        let response = self
            .inner
            .client
            .patch(self.url(&path))
            .bearer_auth(&self.inner.api_token)
            .json(update)
            .send()
            .await?;

        Self::read(response, "Failed to update subscription").await
    }

    /// Apply the retention or reactivation coupon to the customer's subscription.
    ///
    /// # Errors
    ///
    /// Returns `CultoError::Api` ("Failed to apply coupon") on non-2xx.
    #[instrument(skip(self))]
    pub async fn apply_coupon(
        &self,
        email: &str,
        flow_type: FlowType,
    ) -> Result<serde_json::Value, CultoError> {
        let response = self
            .inner
            .client
            .post(self.url("/coupons/apply"))
            .bearer_auth(&self.inner.api_token)
            .json(&ApplyCouponRequest { email, flow_type })
            .send()
            .await?;

        Self::read(response, "Failed to apply coupon").await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = CultoError::Api {
            status: 422,
            context: "Failed to update subscription",
            body: r#"{"error":"invalid price"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"Failed to update subscription (422): {"error":"invalid price"}"#
        );
    }

    #[test]
    fn test_envelope_parses_subscriptions() {
        let body = r#"{
            "data": [{
                "id": "sub_9",
                "status": "RETRYING",
                "grinding_type": "COLD_BREW",
                "next_charge_date": "2026-11-03T00:00:00.000Z",
                "delivery_method": "PICKUP",
                "pickup_location": "Epa",
                "metadata": "{\"itau_year\": true}",
                "coupon": {"flow_type": "RETENTION"},
                "price": {
                    "id": "price_4",
                    "shopify_product_id": "7788",
                    "bag_amount": 2,
                    "description": "Suscripción Plan Mix x2"
                }
            }]
        }"#;
        let envelope: DataEnvelope<Vec<Subscription>> = serde_json::from_str(body).unwrap();
        let sub = envelope.data.first().unwrap();
        assert_eq!(sub.plan_name(), "Plan Mix");
        assert!(sub.is_itau());
        assert!(sub.has_applied_flow_coupon());
        assert!(!sub.is_offer_eligible());
    }

    #[test]
    fn test_coupon_request_body() {
        let body = serde_json::to_value(ApplyCouponRequest {
            email: "ana@culto.coffee",
            flow_type: FlowType::Reactivation,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"email": "ana@culto.coffee", "flow_type": "REACTIVATION"})
        );
    }
}
