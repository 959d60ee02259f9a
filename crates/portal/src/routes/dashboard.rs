//! Dashboard rendering and the app-proxy entry point.
//!
//! Every screen is drawn by one [`DashboardTemplate`]: a [`Shell`] with the
//! header, tab bar and banner, and a [`Screen`] picked from the navigator.
//! An open overlay replaces the screen entirely.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Datelike, NaiveDate, Utc};
use tracing::instrument;

use culto_portal_core::catalog;
use culto_portal_core::flow::{
    DeliverySelection, MainVariant, Overlay, ReactivateWizard, StatusCard, TABS, ViewType,
    effective_status, payment,
};
use culto_portal_core::format;
use culto_portal_core::validation::CardSummary;
use culto_portal_core::{Subscription, SubscriptionStatus, current_subscription, grind_label};

use super::benefits::BenefitsView;
use super::cancel::CancelView;
use super::date::DateView;
use super::debug::DebugPanel;
use super::delivery::DeliveryView;
use super::orders::{self, OrdersView};
use super::payment::PaymentView;
use super::plan::PlanView;
use super::profile::{self, DataView};
use super::reactivate::ReactivateView;
use super::{admin_token, load_subscriptions, today};
use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::Portal;
use crate::models::{Banner, CustomerIdentity, PortalSession};
use crate::shopify::{AdminAccess, Customer, ShopifyError, app_proxy};
use crate::state::AppState;

// =============================================================================
// Templates
// =============================================================================

/// One entry of the tab bar.
#[derive(Debug, Clone)]
pub struct TabLink {
    pub view: &'static str,
    pub label: &'static str,
    pub active: bool,
}

/// Page chrome shared by every screen.
#[derive(Debug, Clone)]
pub struct Shell {
    /// Proxy prefix for links and form actions, without trailing slash.
    pub base: String,
    pub title: &'static str,
    pub tabs: Vec<TabLink>,
    pub show_tabs: bool,
    pub show_close: bool,
    pub banner: Option<Banner>,
    pub debug: Option<DebugPanel>,
    pub help_url: Option<String>,
}

/// What the body of the page shows.
#[derive(Debug, Clone)]
pub enum Screen {
    Main(MainView),
    Orders(OrdersView),
    Benefits(BenefitsView),
    Data(DataView),
    Payment(PaymentView),
    CancelReason(CancelView),
    CancelOffer(CancelView),
    CancelConfirm(CancelView),
    CancelSuccess(CancelView),
    BenefitSuccess(CancelView),
    Plan(PlanView),
    Date(DateView),
    Delivery(DeliveryView),
    Reactivate(ReactivateView),
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shell: Shell,
    pub screen: Screen,
}

/// "Iniciá sesión" page for visitors without a bound customer.
#[derive(Template, WebTemplate)]
#[template(path = "login.html")]
pub struct LoginTemplate;

/// 401 with the login page.
#[must_use]
pub fn login_page() -> Response {
    (StatusCode::UNAUTHORIZED, LoginTemplate).into_response()
}

// =============================================================================
// Main Screen
// =============================================================================

/// Display data for "Mi suscripción".
#[derive(Debug, Clone)]
pub struct MainView {
    pub greeting: String,
    /// `active`, `cancelled`, `paused` or `empty`
    pub variant: &'static str,
    pub card: StatusCard,
    pub plan_name: String,
    pub plan_detail: String,
    /// `"Jueves 12 de diciembre"`
    pub next_delivery: String,
    /// `"12 de diciembre"`
    pub next_charge: String,
    /// Day of the month the plan is charged.
    pub charge_day: Option<u32>,
    pub delivery_label: &'static str,
    pub delivery_detail: String,
    pub payment_card: String,
}

/// `"2 bolsas de 250 g · En grano"`
pub(crate) fn plan_detail(subscription: &Subscription) -> String {
    let grind = grind_label(&subscription.grinding_type);
    match catalog::quantity(subscription.price.bag_amount) {
        Some(quantity) => format!("{} · {grind}", quantity.label),
        None => grind,
    }
}

impl MainView {
    #[must_use]
    pub fn new(
        first_name: &str,
        status: SubscriptionStatus,
        current: Option<&Subscription>,
        known_card: Option<&CardSummary>,
    ) -> Self {
        let next: Option<NaiveDate> = current.and_then(Subscription::next_charge);
        let (delivery_label, delivery_detail) =
            DeliverySelection::from_subscription(current).summary();

        Self {
            greeting: if first_name.is_empty() {
                "Hola".to_string()
            } else {
                format!("Hola, {first_name}")
            },
            variant: match MainVariant::from_status(status, current.is_some()) {
                MainVariant::Active => "active",
                MainVariant::Cancelled => "cancelled",
                MainVariant::Paused => "paused",
                MainVariant::Empty => "empty",
            },
            card: StatusCard::for_status(status),
            plan_name: current.map(Subscription::plan_name).unwrap_or_default(),
            plan_detail: current.map(plan_detail).unwrap_or_default(),
            next_delivery: next.map(format::weekday_day_month).unwrap_or_default(),
            next_charge: next.map(format::day_month).unwrap_or_default(),
            charge_day: next.map(|d| d.day()),
            delivery_label,
            delivery_detail,
            payment_card: payment::current_card(known_card).display(),
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

/// Which page is being drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    /// The standalone `/reactivate` page.
    Reactivate,
}

impl Shell {
    fn new(state: &AppState, session: &mut PortalSession, page: Page, title: &'static str) -> Self {
        let navigator = &session.navigator;
        let on_dashboard = page == Page::Dashboard;
        let config = state.config();

        Self {
            base: session.base_path().to_string(),
            title,
            tabs: TABS
                .iter()
                .map(|tab| TabLink {
                    view: tab.view.as_str(),
                    label: tab.label,
                    active: tab.view == navigator.view(),
                })
                .collect(),
            show_tabs: on_dashboard && navigator.shows_tabs(),
            show_close: on_dashboard && navigator.overlay().is_none() && navigator.view().shows_close(),
            debug: config
                .debug_tools
                .then(|| DebugPanel::new(session.status_override)),
            help_url: config.help_url.clone(),
            banner: session.take_banner(),
        }
    }
}

/// Load the subscription, draw the current screen and save the session.
pub(crate) async fn render(state: &AppState, mut portal: Portal, page: Page) -> Result<Response> {
    let Some(customer) = portal.state.customer.clone() else {
        return Ok(login_page());
    };
    set_sentry_user(&customer.id, customer.email.as_deref());

    let subscriptions = match load_subscriptions(state, &customer).await {
        Ok(subscriptions) => subscriptions,
        Err(e) => {
            if portal.state.banner.is_none() {
                portal.state.flash_error(e.to_string());
            }
            Vec::new()
        }
    };
    let current = current_subscription(&subscriptions);
    let status = effective_status(portal.state.status_override, current);

    let (screen, title) = match page {
        Page::Reactivate => {
            let wizard = portal
                .state
                .standalone
                .get_or_insert_with(ReactivateWizard::standalone);
            let title = wizard.title();
            let view = ReactivateView::new(wizard, current, portal.state.card.as_ref());
            (Screen::Reactivate(view), title)
        }
        Page::Dashboard => {
            let screen = dashboard_screen(state, &mut portal, &customer, current, status).await;
            (screen, portal.state.navigator.title())
        }
    };

    let shell = Shell::new(state, &mut portal.state, page, title);
    portal.save().await?;
    Ok(DashboardTemplate { shell, screen }.into_response())
}

async fn dashboard_screen(
    state: &AppState,
    portal: &mut Portal,
    customer: &CustomerIdentity,
    current: Option<&Subscription>,
    status: SubscriptionStatus,
) -> Screen {
    let session = &portal.state;
    if let Some(overlay) = session.navigator.overlay() {
        return match overlay {
            Overlay::ModifyPlan(w) => Screen::Plan(PlanView::new(w)),
            Overlay::ModifyDate(w) => Screen::Date(DateView::new(w, today())),
            Overlay::ModifyDelivery(w) => Screen::Delivery(DeliveryView::new(w)),
            Overlay::Reactivate(w) => {
                Screen::Reactivate(ReactivateView::new(w, current, session.card.as_ref()))
            }
        };
    }

    let cancel = || CancelView::new(&portal.state.navigator, current);
    match session.navigator.view() {
        ViewType::Main => Screen::Main(MainView::new(
            &customer.first_name,
            status,
            current,
            session.card.as_ref(),
        )),
        ViewType::Orders => Screen::Orders(orders::load(state, portal).await),
        ViewType::Benefits => {
            Screen::Benefits(BenefitsView::new(status, current, &customer.first_name))
        }
        ViewType::Data => {
            profile::seed_profile(state, portal).await;
            let profile = portal.state.profile.clone().unwrap_or_default();
            Screen::Data(DataView::new(&profile, Utc::now()))
        }
        ViewType::PaymentMethod => {
            Screen::Payment(PaymentView::new(session.payment, session.card.as_ref()))
        }
        ViewType::CancelReason => Screen::CancelReason(cancel()),
        ViewType::CancelOffer => Screen::CancelOffer(cancel()),
        ViewType::CancelConfirm => Screen::CancelConfirm(cancel()),
        ViewType::CancelSuccess => Screen::CancelSuccess(cancel()),
        ViewType::BenefitSuccess => Screen::BenefitSuccess(cancel()),
    }
}

// =============================================================================
// Entry Point
// =============================================================================

/// `GET /`: the storefront reaches this through the app proxy.
///
/// A signed request binds its logged-in customer to the session. Without
/// proxy parameters the session's dashboard is drawn as is.
#[instrument(skip(state, portal, params))]
pub async fn index(
    State(state): State<AppState>,
    mut portal: Portal,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Response> {
    if let Some(proxy) = app_proxy::ProxyRequest::from_params(&params) {
        if !app_proxy::verify(&params, state.shopify_secret()) {
            tracing::warn!(shop = %proxy.shop, "Invalid app proxy signature");
            return Ok(login_page());
        }

        match proxy.logged_in_customer_id.as_deref() {
            Some(customer_id) => {
                bind_customer(
                    &state,
                    &mut portal,
                    &proxy.shop,
                    customer_id,
                    proxy.path_prefix.as_deref().unwrap_or_default(),
                )
                .await;
            }
            None => {
                // Logged out on the storefront
                if portal.state.customer.is_some() {
                    portal.state = PortalSession::default();
                    portal.save().await?;
                    clear_sentry_user();
                }
                return Ok(login_page());
            }
        }
    }

    render(&state, portal, Page::Dashboard).await
}

/// Attach the storefront customer to the session, starting a fresh
/// dashboard when the customer changed.
async fn bind_customer(
    state: &AppState,
    portal: &mut Portal,
    shop: &str,
    customer_id: &str,
    path_prefix: &str,
) {
    if portal.state.is_bound_to(shop, customer_id) {
        if let Some(customer) = portal.state.customer.as_mut() {
            path_prefix.clone_into(&mut customer.path_prefix);
        }
        return;
    }

    let (email, first_name) = match fetch_customer(state, portal, shop, customer_id).await {
        Ok(customer) => (customer.email, customer.first_name),
        Err(e) => {
            tracing::warn!(error = %e, shop, customer_id, "Binding customer without Shopify profile");
            (None, String::new())
        }
    };

    tracing::info!(shop, customer_id, "Customer bound to session");
    portal.state = PortalSession::for_customer(CustomerIdentity {
        id: customer_id.to_string(),
        shop: shop.to_string(),
        path_prefix: path_prefix.to_string(),
        email,
        first_name,
    });
}

async fn fetch_customer(
    state: &AppState,
    portal: &Portal,
    shop: &str,
    customer_id: &str,
) -> std::result::Result<Customer, ShopifyError> {
    let token = admin_token(state, portal, shop)
        .await
        .ok_or_else(|| ShopifyError::OAuth("Missing Shopify access token".to_string()))?;
    let access = AdminAccess {
        shop,
        token: &token,
    };
    state.admin().customer(&access, customer_id).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use culto_portal_core::{DeliveryMethod, Price};

    fn subscription(status: SubscriptionStatus) -> Subscription {
        Subscription {
            id: "sub_1".to_string(),
            status,
            grinding_type: "GRAINS".to_string(),
            next_charge_date: "2026-12-10".to_string(),
            delivery_method: DeliveryMethod::Pickup,
            pickup_location: Some("Ciudad Vieja".to_string()),
            address: None,
            metadata: None,
            coupon: None,
            price: Price {
                id: "price_1".to_string(),
                shopify_product_id: "gid://shopify/Product/1".to_string(),
                bag_amount: 2,
                description: "Plan Brasil - 2 bolsas".to_string(),
            },
        }
    }

    #[test]
    fn test_main_view_active() {
        let sub = subscription(SubscriptionStatus::Active);
        let view = MainView::new("Ana", SubscriptionStatus::Active, Some(&sub), None);

        assert_eq!(view.greeting, "Hola, Ana");
        assert_eq!(view.variant, "active");
        assert_eq!(view.card.title, "TU SUSCRIPCIÓN ESTÁ ACTIVA");
        assert_eq!(view.plan_name, "Plan Brasil");
        assert_eq!(view.next_delivery, "Jueves 10 de diciembre");
        assert_eq!(view.next_charge, "10 de diciembre");
        assert_eq!(view.charge_day, Some(10));
        assert_eq!(view.delivery_label, "Retiro en local");
        assert_eq!(view.payment_card, "Visa •••• 1234");
    }

    #[test]
    fn test_main_view_variants() {
        let sub = subscription(SubscriptionStatus::Paused);
        let cancelled = MainView::new("", SubscriptionStatus::Paused, Some(&sub), None);
        assert_eq!(cancelled.variant, "cancelled");
        assert_eq!(cancelled.greeting, "Hola");

        let paused = MainView::new("Ana", SubscriptionStatus::PausedInvoluntary, Some(&sub), None);
        assert_eq!(paused.variant, "paused");
        assert!(paused.card.description_alt.is_some());

        let empty = MainView::new("Ana", SubscriptionStatus::Paused, None, None);
        assert_eq!(empty.variant, "empty");
        assert!(empty.plan_name.is_empty());
        assert!(empty.charge_day.is_none());
    }

    #[test]
    fn test_login_page_is_unauthorized() {
        assert_eq!(login_page().status(), StatusCode::UNAUTHORIZED);
    }
}
