//! Session-related types.
//!
//! Everything the portal remembers about a visitor between requests lives in
//! one [`PortalSession`] value, stored under [`keys::PORTAL`]. The OAuth
//! state and online token sit under their own keys because they belong to
//! the merchant install flow, not to the customer dashboard.

use serde::{Deserialize, Serialize};

use culto_portal_core::flow::{
    Navigator, PaymentMethodState, PhoneVerification, ProfileErrors, ProfileForm,
    ReactivateWizard,
};
use culto_portal_core::validation::CardSummary;
use culto_portal_core::SubscriptionStatus;

/// The storefront customer bound through a signed app-proxy request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerIdentity {
    /// Numeric Shopify customer id (no `gid://` prefix).
    pub id: String,
    /// `*.myshopify.com` domain the request came from.
    pub shop: String,
    /// Proxy prefix the storefront serves the portal under, e.g. `/apps/suscripcion`.
    #[serde(default)]
    pub path_prefix: String,
    /// Unknown when the Shopify lookup failed.
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    Error,
    Success,
}

/// One-shot message shown above the current screen on the next render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

impl Banner {
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.kind {
            BannerKind::Error => "banner banner-error",
            BannerKind::Success => "banner banner-success",
        }
    }
}

/// "Datos" tab state: the last posted form, its errors and the phone check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileState {
    pub draft: ProfileForm,
    pub errors: ProfileErrors,
    pub phone: PhoneVerification,
    pub saved: bool,
}

impl ProfileState {
    /// Seed from the Shopify customer record.
    #[must_use]
    pub fn from_form(form: ProfileForm) -> Self {
        let phone = PhoneVerification::new(&form.phone);
        Self {
            draft: form,
            errors: ProfileErrors::default(),
            phone,
            saved: false,
        }
    }
}

/// Per-visitor dashboard state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PortalSession {
    pub customer: Option<CustomerIdentity>,
    pub navigator: Navigator,
    /// Debug panel override of the subscription status.
    pub status_override: Option<SubscriptionStatus>,
    pub profile: Option<ProfileState>,
    pub payment: PaymentMethodState,
    /// Last card entered in this session. Only brand and last four digits.
    pub card: Option<CardSummary>,
    pub banner: Option<Banner>,
    /// The `/reactivate` page wizard, separate from the dashboard overlay.
    pub standalone: Option<ReactivateWizard>,
}

impl PortalSession {
    /// A fresh dashboard for `customer`.
    #[must_use]
    pub fn for_customer(customer: CustomerIdentity) -> Self {
        Self {
            customer: Some(customer),
            ..Self::default()
        }
    }

    /// Whether the session already belongs to this shop and customer.
    #[must_use]
    pub fn is_bound_to(&self, shop: &str, customer_id: &str) -> bool {
        self.customer
            .as_ref()
            .is_some_and(|c| c.shop == shop && c.id == customer_id)
    }

    /// Path prefix for links and form actions.
    #[must_use]
    pub fn base_path(&self) -> &str {
        self.customer
            .as_ref()
            .map_or("", |c| c.path_prefix.trim_end_matches('/'))
    }

    /// Remove and return the banner so it is shown once.
    pub const fn take_banner(&mut self) -> Option<Banner> {
        self.banner.take()
    }

    pub fn flash_error(&mut self, message: impl Into<String>) {
        self.banner = Some(Banner::error(message));
    }

    pub fn flash_success(&mut self, message: impl Into<String>) {
        self.banner = Some(Banner::success(message));
    }
}

/// Session keys.
pub mod keys {
    /// Key for the [`super::PortalSession`].
    pub const PORTAL: &str = "portal";

    /// Key for Shopify OAuth state (CSRF protection).
    pub const SHOPIFY_OAUTH_STATE: &str = "shopify_oauth_state";

    /// Key for the online Admin API token from the OAuth callback.
    pub const SHOPIFY_ONLINE_TOKEN: &str = "shopify_online_token";
}
