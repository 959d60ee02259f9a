//! Subscription DTOs mirrored from the Culto API and the rules derived from them.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use super::status::{DeliveryMethod, FlowType, SubscriptionStatus};

static PLAN_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bPlan\s+\w+").unwrap_or_else(|_| unreachable!()));

/// Fallback when a price description does not name a plan.
pub const DEFAULT_PLAN_NAME: &str = "Plan";

/// Shipping address as stored by the Culto API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Address {
    pub address1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address2: Option<String>,
    pub city: String,
    pub province: String,
    pub zip: String,
    pub country: String,
}

/// A subscription price (one plan at one bag amount).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub id: String,
    pub shopify_product_id: String,
    pub bag_amount: u32,
    pub description: String,
}

impl Price {
    /// Plan name embedded in the description, e.g. `"Plan Mundial"`.
    #[must_use]
    pub fn plan_name(&self) -> String {
        plan_name(&self.description)
    }
}

/// Coupon attached to a subscription.
///
/// The API sends `flow_type` either as a single code or as a list of codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Coupon {
    #[serde(
        default,
        rename = "flow_type",
        deserialize_with = "deserialize_flow_types",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub flow_types: Vec<String>,
}

impl Coupon {
    /// Whether the coupon came from the retention or reactivation flow.
    #[must_use]
    pub fn is_flow_coupon(&self) -> bool {
        self.flow_types.iter().any(|code| {
            code.contains(FlowType::Retention.as_str())
                || code.contains(FlowType::Reactivation.as_str())
        })
    }
}

fn deserialize_flow_types<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(
        match Option::<OneOrMany>::deserialize(deserializer)? {
            None => Vec::new(),
            Some(OneOrMany::One(code)) => vec![code],
            Some(OneOrMany::Many(codes)) => codes,
        },
    )
}

/// A customer's subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub status: SubscriptionStatus,
    pub grinding_type: String,
    pub next_charge_date: String,
    pub delivery_method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    /// Free-form metadata; the API sends either a JSON string or an object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupon: Option<Coupon>,
    pub price: Price,
}

impl Subscription {
    /// Plan name of the subscribed price.
    #[must_use]
    pub fn plan_name(&self) -> String {
        self.price.plan_name()
    }

    /// Whether a retention or reactivation coupon is already applied.
    #[must_use]
    pub fn has_applied_flow_coupon(&self) -> bool {
        self.coupon.as_ref().is_some_and(Coupon::is_flow_coupon)
    }

    /// Whether this is an Itaú annual subscription (`metadata.itau_year == true`).
    ///
    /// Unparseable metadata counts as "not Itaú".
    #[must_use]
    pub fn is_itau(&self) -> bool {
        let parsed = match &self.metadata {
            None => return false,
            Some(serde_json::Value::String(raw)) => {
                match serde_json::from_str::<serde_json::Value>(raw) {
                    Ok(value) => value,
                    Err(_) => return false,
                }
            }
            Some(value) => value.clone(),
        };

        parsed
            .get("itau_year")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Whether the cancellation funnel may offer the retention discount.
    #[must_use]
    pub fn is_offer_eligible(&self) -> bool {
        !self.has_applied_flow_coupon() && !self.is_itau()
    }

    /// The next charge date, accepting plain dates and RFC 3339 timestamps.
    #[must_use]
    pub fn next_charge(&self) -> Option<NaiveDate> {
        parse_api_date(&self.next_charge_date)
    }
}

/// Parse a date the Culto API sends as `YYYY-MM-DD` or RFC 3339.
#[must_use]
pub fn parse_api_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// PATCH body for `/subscriptions/{id}`. Unset fields are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
pub struct SubscriptionUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shopify_variant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SubscriptionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grinding_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_method: Option<DeliveryMethod>,
    /// `Some(None)` sends an explicit `null`, clearing the pickup store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_location: Option<Option<String>>,
    /// `Some(None)` sends an explicit `null`, clearing the address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<Address>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_charge_date: Option<NaiveDate>,
}

impl SubscriptionUpdate {
    /// Whether the update would send an empty body.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.price_id.is_none()
            && self.shopify_variant_id.is_none()
            && self.status.is_none()
            && self.grinding_type.is_none()
            && self.cancellation_reason.is_none()
            && self.delivery_method.is_none()
            && self.pickup_location.is_none()
            && self.address.is_none()
            && self.next_charge_date.is_none()
    }
}

/// Pick the subscription the portal should show.
///
/// The last ACTIVE/RETRYING one wins; otherwise the last PAUSED or
/// PAUSED_INVOLUNTARY one.
#[must_use]
pub fn current_subscription(subscriptions: &[Subscription]) -> Option<&Subscription> {
    subscriptions
        .iter()
        .rev()
        .find(|s| s.status.is_active())
        .or_else(|| subscriptions.iter().rev().find(|s| s.status.is_paused()))
}

/// Extract `"Plan <word>"` from a price description.
#[must_use]
pub fn plan_name(description: &str) -> String {
    PLAN_NAME_PATTERN
        .find(description)
        .map_or_else(|| DEFAULT_PLAN_NAME.to_owned(), |m| m.as_str().to_owned())
}
