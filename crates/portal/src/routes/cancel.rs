//! Cancellation funnel handlers.
//!
//! The navigator resolves each button to a [`CancelStep`]. When the step
//! carries a command (retention coupon, pause) the call runs first and the
//! funnel only moves if it succeeded.

use axum::{
    Form,
    extract::{Path, State},
    response::Redirect,
};
use chrono::Datelike;
use serde::Deserialize;
use tracing::instrument;

use culto_portal_core::flow::{CancelAction, CancelCommand, CancelStep, FlowError, Navigator};
use culto_portal_core::format;
use culto_portal_core::{
    CancellationReason, FlowType, Subscription, SubscriptionStatus, SubscriptionUpdate,
};

use super::{ActionError, back_home, load_current, report, require_current, upstream};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Portal;
use crate::models::{CustomerIdentity, PortalSession};
use crate::state::AppState;

const COUPON_FAILED: &str = "No pudimos aplicar el beneficio. Probá de nuevo.";
const CANCEL_FAILED: &str = "No pudimos cancelar tu suscripción. Probá de nuevo.";

/// Reason picker form data.
#[derive(Debug, Deserialize)]
pub struct ReasonForm {
    pub reason: Option<CancellationReason>,
}

/// One radio button of the reason picker.
#[derive(Debug, Clone)]
pub struct ReasonOption {
    pub code: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Display data shared by the funnel screens.
#[derive(Debug, Clone)]
pub struct CancelView {
    pub reasons: Vec<ReasonOption>,
    pub has_reason: bool,
    pub reason_label: &'static str,
    pub plan_name: String,
    /// `"Jueves 12 de diciembre"`
    pub next_delivery: String,
    pub charge_day: Option<u32>,
}

impl CancelView {
    #[must_use]
    pub fn new(navigator: &Navigator, current: Option<&Subscription>) -> Self {
        let selected = navigator.cancel_reason();
        let next = current.and_then(Subscription::next_charge);
        Self {
            reasons: CancellationReason::PICKER
                .iter()
                .map(|r| ReasonOption {
                    code: r.code(),
                    label: r.label(),
                    selected: selected == Some(*r),
                })
                .collect(),
            has_reason: selected.is_some(),
            reason_label: selected.map_or("", CancellationReason::label),
            plan_name: current.map(Subscription::plan_name).unwrap_or_default(),
            next_delivery: next.map(format::weekday_day_month).unwrap_or_default(),
            charge_day: next.map(|d| d.day()),
        }
    }
}

/// "Cancelar suscripción": enter the funnel.
///
/// The retention offer is only shown when the current subscription has no
/// flow coupon applied and is not an Itaú annual plan.
#[instrument(skip(state, portal))]
pub async fn start(State(state): State<AppState>, mut portal: Portal) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    match load_current(&state, &customer).await {
        Ok(current) => {
            let eligible = current.as_ref().is_some_and(Subscription::is_offer_eligible);
            portal.state.navigator.start_cancel(eligible);
        }
        Err(e) => portal.state.flash_error(e.to_string()),
    }
    back_home(&portal).await
}

/// Pick a reason.
#[instrument(skip(portal))]
pub async fn reason(mut portal: Portal, Form(form): Form<ReasonForm>) -> Result<Redirect> {
    portal.customer()?;
    let result = form
        .reason
        .ok_or(FlowError::ReasonRequired)
        .and_then(|reason| portal.state.navigator.select_reason(reason));
    report(&mut portal.state, result.map_err(Into::into));
    back_home(&portal).await
}

/// Any other funnel button.
#[instrument(skip(state, portal))]
pub async fn step(
    State(state): State<AppState>,
    mut portal: Portal,
    Path(action): Path<CancelAction>,
) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    let result = run_step(&state, &mut portal.state, &customer, action).await;
    report(&mut portal.state, result);
    back_home(&portal).await
}

async fn run_step(
    state: &AppState,
    session: &mut PortalSession,
    customer: &CustomerIdentity,
    action: CancelAction,
) -> std::result::Result<(), ActionError> {
    let step: CancelStep = session.navigator.plan_cancel(action)?;

    match step.command {
        None => {}
        Some(CancelCommand::ApplyRetentionCoupon) => {
            let email = customer
                .email
                .as_deref()
                .ok_or(FlowError::NoSubscription)?;
            state
                .culto()
                .apply_coupon(email, FlowType::Retention)
                .await
                .map_err(upstream(COUPON_FAILED))?;
            add_breadcrumb("cancel", "Accepted retention offer", None);
            tracing::info!(customer_id = %customer.id, "Retention coupon applied");
        }
        Some(CancelCommand::Pause { reason }) => {
            let subscription = require_current(state, customer).await?;
            let update = SubscriptionUpdate {
                status: Some(SubscriptionStatus::Paused),
                cancellation_reason: Some(reason.code().to_owned()),
                ..SubscriptionUpdate::default()
            };
            state
                .culto()
                .update_subscription(&subscription.id, &update)
                .await
                .map_err(upstream(CANCEL_FAILED))?;
            add_breadcrumb(
                "cancel",
                "Subscription cancelled",
                Some(&[
                    ("subscription_id", subscription.id.as_str()),
                    ("reason", reason.code()),
                ]),
            );
            tracing::info!(
                customer_id = %customer.id,
                subscription_id = %subscription.id,
                reason = reason.code(),
                "Subscription cancelled"
            );
        }
    }

    session.navigator.commit_cancel(step);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_view_marks_selected_reason() {
        let mut nav = Navigator::new();
        nav.start_cancel(true);
        nav.select_reason(CancellationReason::Vacations).ok();

        let view = CancelView::new(&nav, None);
        assert_eq!(view.reasons.len(), 7);
        assert!(view.has_reason);
        assert_eq!(view.reason_label, "Me voy de vacaciones");
        let selected: Vec<_> = view.reasons.iter().filter(|r| r.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.first().map(|r| r.code), Some("VACATIONS"));
    }

    #[test]
    fn test_view_without_reason() {
        let mut nav = Navigator::new();
        nav.start_cancel(false);

        let view = CancelView::new(&nav, None);
        assert!(!view.has_reason);
        assert_eq!(view.reason_label, "");
        assert!(view.reasons.iter().all(|r| !r.selected));
        assert!(view.plan_name.is_empty());
    }

    #[test]
    fn test_reason_form_parses_api_code() {
        let form: ReasonForm = serde_json::from_str(r#"{"reason":"DO_NOT_LIKE_COFFEE"}"#).unwrap();
        assert_eq!(form.reason, Some(CancellationReason::DoNotLikeCoffee));

        let empty: ReasonForm = serde_json::from_str("{}").unwrap();
        assert!(empty.reason.is_none());
    }
}
