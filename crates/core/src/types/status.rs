//! Status enums for subscriptions, deliveries and coupon flows.

use serde::{Deserialize, Serialize};

/// Subscription status as reported by the Culto API.
///
/// `Paused` is what the API uses for a subscription the customer cancelled;
/// `PausedInvoluntary` is a payment failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Paused,
    PausedInvoluntary,
    Retrying,
}

impl SubscriptionStatus {
    /// Every status, in the order the debug panel lists them.
    pub const ALL: [Self; 4] = [
        Self::Active,
        Self::Paused,
        Self::PausedInvoluntary,
        Self::Retrying,
    ];

    /// The API code (`ACTIVE`, `PAUSED`, ...).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Paused => "PAUSED",
            Self::PausedInvoluntary => "PAUSED_INVOLUNTARY",
            Self::Retrying => "RETRYING",
        }
    }

    /// Human-readable label shown to customers and in the debug panel.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Active => "Activa",
            Self::Paused => "Cancelada",
            Self::PausedInvoluntary => "Pausada (involuntaria)",
            Self::Retrying => "Reintentando",
        }
    }

    /// Whether the customer is still receiving coffee.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active | Self::Retrying)
    }

    /// Whether the subscription is stopped, by choice or by a failed charge.
    #[must_use]
    pub const fn is_paused(self) -> bool {
        matches!(self, Self::Paused | Self::PausedInvoluntary)
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(Self::Active),
            "PAUSED" => Ok(Self::Paused),
            "PAUSED_INVOLUNTARY" => Ok(Self::PausedInvoluntary),
            "RETRYING" => Ok(Self::Retrying),
            _ => Err(format!("invalid subscription status: {s}")),
        }
    }
}

/// How a subscription's coffee reaches the customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryMethod {
    #[default]
    Shipping,
    Pickup,
}

impl DeliveryMethod {
    /// Spanish label used across the dashboard.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Shipping => "Envío a domicilio",
            Self::Pickup => "Retiro en local",
        }
    }
}

/// Coupon flow a discount was granted through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowType {
    Retention,
    Reactivation,
}

impl FlowType {
    /// The API code sent to `/coupons/apply`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Retention => "RETENTION",
            Self::Reactivation => "REACTIVATION",
        }
    }
}

impl std::fmt::Display for FlowType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RETENTION" => Ok(Self::Retention),
            "REACTIVATION" => Ok(Self::Reactivation),
            _ => Err(format!("invalid flow type: {s}")),
        }
    }
}
