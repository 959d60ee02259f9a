//! Reactivation handlers: the dashboard overlay and the standalone
//! `/reactivate` page.
//!
//! Both run the same [`ReactivateWizard`]; the overlay lives in the
//! navigator, the page's wizard in `PortalSession::standalone`.

use axum::{
    Form,
    extract::State,
    response::{Redirect, Response},
};
use serde::Deserialize;
use tracing::instrument;

use culto_portal_core::catalog::DeliveryOption;
use culto_portal_core::flow::{
    BackOutcome, FlowError, Overlay, PlanWizard, ReactivateMode, ReactivateOption,
    ReactivateStep, ReactivateWizard, payment,
};
use culto_portal_core::format;
use culto_portal_core::validation::{CardForm, CardSummary};
use culto_portal_core::{FlowType, Subscription};

use super::dashboard::{self, Page, plan_detail};
use super::delivery::{DeliveryForm, DeliveryFormView};
use super::{ActionError, back_home, load_current, report, require_current, today, upstream};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Portal;
use crate::models::{CustomerIdentity, PortalSession};
use crate::state::AppState;

const REACTIVATE_FAILED: &str = "No pudimos reactivar tu suscripción. Probá de nuevo.";

/// Which wizard a handler drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Overlay,
    Page,
}

fn wizard_mut(session: &mut PortalSession, target: Target) -> Option<&mut ReactivateWizard> {
    match target {
        Target::Overlay => session.navigator.reactivate_wizard(),
        Target::Page => session.standalone.as_mut(),
    }
}

// =============================================================================
// View Model
// =============================================================================

/// Display data for both reactivation screens.
#[derive(Debug, Clone)]
pub struct ReactivateView {
    pub standalone: bool,
    /// Form action prefix, `/reactivate` or `/reactivate/page`.
    pub action: &'static str,
    /// `reactivar`, `delivery`, `payment`, `confirm` or `payment-confirm`
    pub step: &'static str,
    pub title: &'static str,
    pub step_label: Option<String>,
    pub charge_now: bool,
    pub plan_name: String,
    /// `"2 bolsas de 250 g · En grano"`
    pub plan_detail: String,
    pub delivery: Option<DeliveryFormView>,
    /// Current next charge date, `"12 de diciembre"`.
    pub next_date: String,
    pub card: String,
}

impl ReactivateView {
    #[must_use]
    pub fn new(
        wizard: &ReactivateWizard,
        current: Option<&Subscription>,
        known_card: Option<&CardSummary>,
    ) -> Self {
        let standalone = wizard.mode() == ReactivateMode::Standalone;
        Self {
            standalone,
            action: if standalone {
                "/reactivate/page"
            } else {
                "/reactivate"
            },
            step: match wizard.step() {
                ReactivateStep::Reactivar => "reactivar",
                ReactivateStep::Delivery => "delivery",
                ReactivateStep::Payment => "payment",
                ReactivateStep::Confirm => "confirm",
                ReactivateStep::PaymentConfirm => "payment-confirm",
            },
            title: wizard.title(),
            step_label: wizard.step_label(),
            charge_now: wizard.option() == ReactivateOption::ChargeNow,
            plan_name: current.map(Subscription::plan_name).unwrap_or_default(),
            plan_detail: current.map(plan_detail).unwrap_or_default(),
            delivery: wizard.delivery().map(DeliveryFormView::new),
            next_date: current
                .and_then(Subscription::next_charge)
                .map(format::day_month)
                .unwrap_or_default(),
            card: wizard
                .card()
                .cloned()
                .unwrap_or_else(|| payment::current_card(known_card))
                .display(),
        }
    }

    #[must_use]
    pub const fn delivery_form(&self) -> Option<&DeliveryFormView> {
        self.delivery.as_ref()
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Option radios. Either field may be posted.
#[derive(Debug, Deserialize)]
pub struct OptionForm {
    #[serde(default)]
    pub option: Option<ReactivateOption>,
    #[serde(default)]
    pub delivery_option: Option<DeliveryOption>,
}

fn apply_options(wizard: &mut ReactivateWizard, form: &OptionForm) {
    if let Some(option) = form.option {
        wizard.select_option(option);
    }
    if let Some(option) = form.delivery_option {
        wizard.select_delivery_option(option);
    }
}

// =============================================================================
// Shared Steps
// =============================================================================

/// PATCH the subscription back to ACTIVE, then apply the reactivation coupon
/// unless a flow coupon is already there.
async fn finish(
    state: &AppState,
    session: &mut PortalSession,
    customer: &CustomerIdentity,
    target: Target,
    card: Option<&CardForm>,
) -> std::result::Result<(), ActionError> {
    let (update, summary) = wizard_mut(session, target)
        .ok_or(FlowError::InvalidAction)?
        .reactivation_request(card, today())?;

    let subscription = require_current(state, customer).await?;
    state
        .culto()
        .update_subscription(&subscription.id, &update)
        .await
        .map_err(upstream(REACTIVATE_FAILED))?;

    add_breadcrumb(
        "reactivate",
        "Subscription reactivated",
        Some(&[("subscription_id", subscription.id.as_str())]),
    );
    tracing::info!(
        customer_id = %customer.id,
        subscription_id = %subscription.id,
        charge_now = update.next_charge_date.is_some(),
        "Subscription reactivated"
    );

    if !subscription.has_applied_flow_coupon()
        && let Some(email) = customer.email.as_deref()
        && let Err(e) = state
            .culto()
            .apply_coupon(email, FlowType::Reactivation)
            .await
    {
        // The subscription is already active again
        tracing::warn!(error = %e, subscription_id = %subscription.id, "Reactivation coupon not applied");
    }

    if let Some(card) = &summary {
        session.card = Some(card.clone());
    }
    if let Some(wizard) = wizard_mut(session, target) {
        wizard.mark_reactivated(summary);
    }
    Ok(())
}

/// "Confirmar reactivación" on a step without a form.
async fn continue_or_finish(
    state: &AppState,
    session: &mut PortalSession,
    customer: &CustomerIdentity,
    target: Target,
) -> std::result::Result<(), ActionError> {
    let wizard = wizard_mut(session, target).ok_or(FlowError::InvalidAction)?;
    if wizard.continue_finishes() {
        finish(state, session, customer, target, None).await
    } else {
        Ok(wizard.advance()?)
    }
}

// =============================================================================
// Overlay Handlers
// =============================================================================

/// "Reactivar {plan}".
#[instrument(skip(state, portal))]
pub async fn open(State(state): State<AppState>, mut portal: Portal) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    match load_current(&state, &customer).await {
        Ok(current) => portal
            .state
            .navigator
            .open_overlay(Overlay::Reactivate(ReactivateWizard::overlay(current.as_ref()))),
        Err(e) => portal.state.flash_error(e.to_string()),
    }
    back_home(&portal).await
}

/// Charge-now/keep-date or envío/retiro radio.
#[instrument(skip(portal))]
pub async fn option(mut portal: Portal, Form(form): Form<OptionForm>) -> Result<Redirect> {
    portal.customer()?;
    let result = wizard_mut(&mut portal.state, Target::Overlay)
        .map(|w| apply_options(w, &form))
        .ok_or(FlowError::InvalidAction);
    report(&mut portal.state, result.map_err(Into::into));
    back_home(&portal).await
}

/// "Continuar" on the first step.
#[instrument(skip(state, portal))]
pub async fn continue_step(State(state): State<AppState>, mut portal: Portal) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    let result = continue_or_finish(&state, &mut portal.state, &customer, Target::Overlay).await;
    report(&mut portal.state, result);
    back_home(&portal).await
}

/// Delivery step: store the form, then finish (keep-date) or go to payment.
#[instrument(skip(state, portal, form))]
pub async fn delivery(
    State(state): State<AppState>,
    mut portal: Portal,
    Form(form): Form<DeliveryForm>,
) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    let (option, store_id, address) = form.into_parts();
    let submitted = wizard_mut(&mut portal.state, Target::Overlay)
        .ok_or(FlowError::InvalidAction)
        .and_then(|w| w.submit_delivery(option, store_id.as_deref(), address));
    let result = match submitted {
        Ok(()) => continue_or_finish(&state, &mut portal.state, &customer, Target::Overlay).await,
        Err(e) => Err(e.into()),
    };
    report(&mut portal.state, result);
    back_home(&portal).await
}

/// "Confirmar pago y reactivar plan".
#[instrument(skip(state, portal, card))]
pub async fn payment(
    State(state): State<AppState>,
    mut portal: Portal,
    Form(card): Form<CardForm>,
) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    let result = finish(&state, &mut portal.state, &customer, Target::Overlay, Some(&card)).await;
    report(&mut portal.state, result);
    back_home(&portal).await
}

/// "Prefiero cambiar de plan": swap the overlay for the plan wizard.
#[instrument(skip(state, portal))]
pub async fn change_plan(State(state): State<AppState>, mut portal: Portal) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    let current = load_current(&state, &customer).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Opening plan wizard without the current subscription");
        None
    });
    portal
        .state
        .navigator
        .open_overlay(Overlay::ModifyPlan(PlanWizard::new(false, current.as_ref())));
    back_home(&portal).await
}

// =============================================================================
// Standalone Page
// =============================================================================

/// `GET /reactivate`
#[instrument(skip(state, portal))]
pub async fn page(State(state): State<AppState>, mut portal: Portal) -> Result<Response> {
    if portal.state.customer.is_none() {
        return Ok(dashboard::login_page());
    }
    portal
        .state
        .standalone
        .get_or_insert_with(ReactivateWizard::standalone);
    dashboard::render(&state, portal, Page::Reactivate).await
}

async fn back_to_page(portal: &Portal) -> Result<Redirect> {
    portal.save().await?;
    Ok(Redirect::to(&portal.path("/reactivate")))
}

fn page_wizard(session: &mut PortalSession) -> &mut ReactivateWizard {
    session
        .standalone
        .get_or_insert_with(ReactivateWizard::standalone)
}

#[instrument(skip(portal))]
pub async fn page_option(mut portal: Portal, Form(form): Form<OptionForm>) -> Result<Redirect> {
    portal.customer()?;
    apply_options(page_wizard(&mut portal.state), &form);
    back_to_page(&portal).await
}

#[instrument(skip(state, portal))]
pub async fn page_continue(State(state): State<AppState>, mut portal: Portal) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    page_wizard(&mut portal.state);
    let result = continue_or_finish(&state, &mut portal.state, &customer, Target::Page).await;
    report(&mut portal.state, result);
    back_to_page(&portal).await
}

#[instrument(skip(state, portal, card))]
pub async fn page_payment(
    State(state): State<AppState>,
    mut portal: Portal,
    Form(card): Form<CardForm>,
) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    let result = finish(&state, &mut portal.state, &customer, Target::Page, Some(&card)).await;
    report(&mut portal.state, result);
    back_to_page(&portal).await
}

/// Back arrow. Leaving from the first step returns to the dashboard.
#[instrument(skip(portal))]
pub async fn page_back(mut portal: Portal) -> Result<Redirect> {
    portal.customer()?;
    let leave = portal
        .state
        .standalone
        .as_mut()
        .is_none_or(|wizard| wizard.page_back() == BackOutcome::Close);
    if leave {
        portal.state.standalone = None;
        back_home(&portal).await
    } else {
        back_to_page(&portal).await
    }
}

/// "Volver a mi cuenta" on the success screens.
#[instrument(skip(portal))]
pub async fn page_done(mut portal: Portal) -> Result<Redirect> {
    portal.customer()?;
    portal.state.standalone = None;
    back_home(&portal).await
}
