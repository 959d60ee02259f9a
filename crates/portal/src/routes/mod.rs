//! HTTP route handlers for the portal.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - App-proxy entry, renders the dashboard
//! GET  /health                    - Health check
//!
//! # Navigation (all POSTs redirect 303 to the dashboard)
//! POST /view                      - Switch tab (form: view)
//! POST /tabs/next                 - Swipe left
//! POST /tabs/prev                 - Swipe right
//!
//! # Cancellation funnel
//! POST /cancel/start              - Enter the funnel
//! POST /cancel/reason             - Pick a reason (form: reason)
//! POST /cancel/{action}           - continue, accept, decline, confirm, keep, back, close
//!
//! # Wizards
//! POST /plan/{open,select,configure,review,confirm,back,close}
//! POST /date/{open,select,continue,confirm,back,close}
//! POST /delivery/{open,option,confirm,back,close}
//! POST /reactivate/{open,option,continue,delivery,payment,change-plan,back,close}
//!
//! # Standalone reactivation page
//! GET  /reactivate
//! POST /reactivate/page/{option,continue,payment,back,done}
//!
//! # Datos / Método de pago
//! POST /data                      - Save the profile
//! POST /data/phone/validate       - Open the code card
//! POST /data/phone/confirm        - Confirm the code
//! POST /data/phone/resend         - Resend the code
//! POST /payment-method            - Save a card
//! POST /payment-method/open       - Open the card form
//!
//! # Debug / session
//! POST /debug/status              - Status override (404 unless enabled)
//! POST /logout                    - Drop the session, log out of the storefront
//!
//! # Shopify OAuth + JSON API
//! GET  /api/auth                  - Redirect to Shopify OAuth
//! GET  /api/auth/callback         - Handle OAuth callback
//! GET  /api/customer-session      - Customer lookup (CORS *)
//! ```

pub mod api;
pub mod auth;
pub mod benefits;
pub mod cancel;
pub mod dashboard;
pub mod date;
pub mod debug;
pub mod delivery;
pub mod navigation;
pub mod orders;
pub mod payment;
pub mod plan;
pub mod profile;
pub mod reactivate;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use chrono::{FixedOffset, NaiveDate, Utc};
use thiserror::Error;

use culto_portal_core::flow::FlowError;
use culto_portal_core::{Subscription, current_subscription};

use crate::error::Result;
use crate::middleware::{Portal, mutation_rate_limiter, oauth_rate_limiter};
use crate::models::{CustomerIdentity, PortalSession};
use crate::state::AppState;

/// Montevideo, which has no daylight saving time.
const PORTAL_UTC_OFFSET_SECS: i32 = -3 * 3600;

const LOAD_FAILED: &str = "No pudimos cargar tu suscripción. Probá de nuevo en unos minutos.";

// =============================================================================
// Shared Helpers
// =============================================================================

/// Why a step did not move. The `Display` text becomes the banner.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Flow(#[from] FlowError),

    /// A Culto or Shopify call failed; the cause is logged where it happened.
    #[error("{0}")]
    Upstream(&'static str),
}

/// Map an API error to a banner message, logging the cause.
pub(crate) fn upstream<E: std::fmt::Display>(message: &'static str) -> impl FnOnce(E) -> ActionError {
    move |e| {
        tracing::warn!(error = %e, "{message}");
        ActionError::Upstream(message)
    }
}

/// Turn a failed step into the error banner.
pub(crate) fn report(state: &mut PortalSession, result: std::result::Result<(), ActionError>) {
    if let Err(e) = result {
        state.flash_error(e.to_string());
    }
}

/// Today on the portal's calendar.
#[must_use]
pub fn today() -> NaiveDate {
    let now = Utc::now();
    FixedOffset::east_opt(PORTAL_UTC_OFFSET_SECS)
        .map_or_else(|| now.date_naive(), |tz| now.with_timezone(&tz).date_naive())
}

/// Save the session and go back to the dashboard.
pub(crate) async fn back_home(portal: &Portal) -> Result<Redirect> {
    portal.save().await?;
    Ok(Redirect::to(&portal.home()))
}

/// The customer's subscriptions, or none when the email is unknown.
pub(crate) async fn load_subscriptions(
    state: &AppState,
    customer: &CustomerIdentity,
) -> std::result::Result<Vec<Subscription>, ActionError> {
    let Some(email) = customer.email.as_deref() else {
        tracing::warn!(customer_id = %customer.id, "No email for customer, skipping subscriptions");
        return Ok(Vec::new());
    };
    state
        .culto()
        .subscriptions(email)
        .await
        .map_err(upstream(LOAD_FAILED))
}

/// The current subscription, if any.
pub(crate) async fn load_current(
    state: &AppState,
    customer: &CustomerIdentity,
) -> std::result::Result<Option<Subscription>, ActionError> {
    let subscriptions = load_subscriptions(state, customer).await?;
    Ok(current_subscription(&subscriptions).cloned())
}

/// The current subscription, required by a mutation.
pub(crate) async fn require_current(
    state: &AppState,
    customer: &CustomerIdentity,
) -> std::result::Result<Subscription, ActionError> {
    load_current(state, customer)
        .await?
        .ok_or(ActionError::Flow(FlowError::NoSubscription))
}

/// Admin API token for the customer's shop.
pub(crate) async fn admin_token(state: &AppState, portal: &Portal, shop: &str) -> Option<String> {
    let online = portal.online_token().await;
    state.admin_token(online.as_ref(), shop, Utc::now().timestamp())
}

// =============================================================================
// Routers
// =============================================================================

/// Create the cancellation funnel router.
pub fn cancel_routes() -> Router<AppState> {
    Router::new()
        .route("/start", post(cancel::start))
        .route("/reason", post(cancel::reason))
        .route("/{action}", post(cancel::step))
}

/// Create the modify-plan wizard router.
pub fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/open", post(plan::open))
        .route("/select", post(plan::select))
        .route("/configure", post(plan::configure))
        .route("/review", post(plan::review))
        .route("/confirm", post(plan::confirm))
        .route("/back", post(navigation::overlay_back))
        .route("/close", post(navigation::overlay_close))
}

/// Create the modify-date wizard router.
pub fn date_routes() -> Router<AppState> {
    Router::new()
        .route("/open", post(date::open))
        .route("/select", post(date::select))
        .route("/continue", post(date::continue_to_payment))
        .route("/confirm", post(date::confirm))
        .route("/back", post(navigation::overlay_back))
        .route("/close", post(navigation::overlay_close))
}

/// Create the modify-delivery wizard router.
pub fn delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/open", post(delivery::open))
        .route("/option", post(delivery::option))
        .route("/confirm", post(delivery::confirm))
        .route("/back", post(navigation::overlay_back))
        .route("/close", post(navigation::overlay_close))
}

/// Create the reactivation router: the overlay steps and the standalone page.
pub fn reactivate_routes() -> Router<AppState> {
    Router::new()
        .route("/open", post(reactivate::open))
        .route("/option", post(reactivate::option))
        .route("/continue", post(reactivate::continue_step))
        .route("/delivery", post(reactivate::delivery))
        .route("/payment", post(reactivate::payment))
        .route("/change-plan", post(reactivate::change_plan))
        .route("/back", post(navigation::overlay_back))
        .route("/close", post(navigation::overlay_close))
        .route("/page/option", post(reactivate::page_option))
        .route("/page/continue", post(reactivate::page_continue))
        .route("/page/payment", post(reactivate::page_payment))
        .route("/page/back", post(reactivate::page_back))
        .route("/page/done", post(reactivate::page_done))
}

/// Create the "Datos" router.
pub fn data_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(profile::save))
        .route("/phone/validate", post(profile::validate_phone))
        .route("/phone/confirm", post(profile::confirm_code))
        .route("/phone/resend", post(profile::resend_code))
}

/// Create the "Método de pago" router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(payment::save))
        .route("/open", post(payment::open))
}

/// Dashboard form posts, behind the mutation rate limiter.
pub fn mutation_routes() -> Router<AppState> {
    Router::new()
        .route("/view", post(navigation::show_view))
        .route("/tabs/next", post(navigation::next_tab))
        .route("/tabs/prev", post(navigation::prev_tab))
        .nest("/cancel", cancel_routes())
        .nest("/plan", plan_routes())
        .nest("/date", date_routes())
        .nest("/delivery", delivery_routes())
        .nest("/reactivate", reactivate_routes())
        .nest("/data", data_routes())
        .nest("/payment-method", payment_routes())
        .route("/debug/status", post(debug::set_status))
        .route("/logout", post(auth::logout))
        .layer(mutation_rate_limiter())
}

/// Create the Shopify OAuth router.
pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(auth::begin))
        .route("/callback", get(auth::callback))
        .layer(oauth_rate_limiter())
}

/// Create all routes for the portal.
pub fn routes() -> Router<AppState> {
    Router::new()
        // App-proxy entry
        .route("/", get(dashboard::index))
        // Standalone reactivation page
        .route("/reactivate", get(reactivate::page))
        // Health check
        .route("/health", get(health))
        // Dashboard form posts
        .merge(mutation_routes())
        // Shopify OAuth
        .nest("/api/auth", oauth_routes())
        // JSON API
        .route(
            "/api/customer-session",
            get(api::customer_session).options(api::preflight),
        )
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_action_error_banner_text() {
        let err = ActionError::from(FlowError::DayRequired);
        assert_eq!(err.to_string(), "Elegí una fecha para continuar.");
        assert_eq!(ActionError::Upstream(LOAD_FAILED).to_string(), LOAD_FAILED);
    }

    #[test]
    fn test_report_sets_error_banner() {
        let mut state = PortalSession::default();
        report(&mut state, Ok(()));
        assert!(state.banner.is_none());

        report(&mut state, Err(FlowError::NoSubscription.into()));
        let banner = state.take_banner().unwrap();
        assert_eq!(banner.message, "No encontramos una suscripción para modificar.");
    }
}
