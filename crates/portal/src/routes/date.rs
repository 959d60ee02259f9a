//! Modify-date wizard handlers.

use axum::{Form, extract::State, response::Redirect};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use tracing::instrument;

use culto_portal_core::flow::{Billing, CalendarDay, DateStep, DateWizard, FlowError, Overlay};
use culto_portal_core::format::{self, WEEKDAY_INITIALS};
use culto_portal_core::validation::CardForm;
use culto_portal_core::SubscriptionUpdate;

use super::{ActionError, back_home, report, require_current, today, upstream};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Portal;
use crate::models::{CustomerIdentity, PortalSession};
use crate::state::AppState;

const UPDATE_FAILED: &str = "No pudimos cambiar la fecha. Probá de nuevo.";

const PAST_DAY_NOTE: &str =
    "Como elegiste un día anterior a hoy, el cambio se va a aplicar a partir del próximo mes.";

#[derive(Debug, Clone)]
pub struct BillingOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Display data for the modify-date overlay.
#[derive(Debug, Clone)]
pub struct DateView {
    /// `step-1`, `step-2` or `step-confirm`
    pub step: &'static str,
    pub title: &'static str,
    pub step_label: Option<String>,
    pub month_label: String,
    pub weekdays: [&'static str; 7],
    /// Empty cells before day 1.
    pub blanks: Vec<u32>,
    pub days: Vec<CalendarDay>,
    pub has_day: bool,
    pub shows_billing: bool,
    pub billing_options: Vec<BillingOption>,
    pub past_day_note: Option<&'static str>,
    /// `"Jueves 12 de diciembre"` for the picked day.
    pub preview_label: String,
    pub new_date_label: String,
    pub card: String,
}

impl DateView {
    #[must_use]
    pub fn new(wizard: &DateWizard, today: NaiveDate) -> Self {
        let shows_billing = wizard.shows_billing_choice(today);
        Self {
            step: match wizard.step() {
                DateStep::PickDay => "step-1",
                DateStep::Payment => "step-2",
                DateStep::Confirmed => "step-confirm",
            },
            title: wizard.title(),
            step_label: wizard.step_label(),
            month_label: format::month_year(today),
            weekdays: WEEKDAY_INITIALS,
            blanks: (0..format::leading_blanks(today)).collect(),
            days: wizard.calendar(today),
            has_day: wizard.day().is_some(),
            shows_billing,
            billing_options: [Billing::NextMonth, Billing::ThisMonth]
                .into_iter()
                .map(|b| BillingOption {
                    value: b.as_str(),
                    label: b.label(),
                    selected: wizard.billing() == b,
                })
                .collect(),
            past_day_note: wizard
                .day()
                .filter(|day| *day < today.day())
                .map(|_| PAST_DAY_NOTE),
            preview_label: wizard
                .preview(today)
                .map(format::weekday_day_month)
                .unwrap_or_default(),
            new_date_label: wizard
                .new_date()
                .map(format::weekday_day_month)
                .unwrap_or_default(),
            card: wizard.card().map(|c| c.display()).unwrap_or_default(),
        }
    }
}

/// Calendar pick and billing radio.
#[derive(Debug, Deserialize)]
pub struct SelectForm {
    pub day: Option<u32>,
    pub billing: Option<String>,
}

/// "Modificar fecha".
#[instrument(skip(portal))]
pub async fn open(mut portal: Portal) -> Result<Redirect> {
    portal.customer()?;
    portal
        .state
        .navigator
        .open_overlay(Overlay::ModifyDate(DateWizard::new()));
    back_home(&portal).await
}

/// Pick a day and/or billing option on step 1.
#[instrument(skip(portal))]
pub async fn select(mut portal: Portal, Form(form): Form<SelectForm>) -> Result<Redirect> {
    portal.customer()?;
    let today = today();
    let result = with_wizard(&mut portal.state, |w| {
        if let Some(day) = form.day {
            w.select_day(day, today)?;
        }
        if let Some(billing) = form.billing.as_deref() {
            let billing = billing
                .parse::<Billing>()
                .map_err(|_| FlowError::InvalidAction)?;
            w.select_billing(billing, today);
        }
        Ok(())
    });
    report(&mut portal.state, result);
    back_home(&portal).await
}

/// "Continuar" on step 1.
#[instrument(skip(portal))]
pub async fn continue_to_payment(mut portal: Portal) -> Result<Redirect> {
    portal.customer()?;
    let result = with_wizard(&mut portal.state, DateWizard::continue_to_payment);
    report(&mut portal.state, result);
    back_home(&portal).await
}

/// "Confirmar cambio de fecha": PATCH `next_charge_date`.
#[instrument(skip(state, portal, card))]
pub async fn confirm(
    State(state): State<AppState>,
    mut portal: Portal,
    Form(card): Form<CardForm>,
) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    let result = run_confirm(&state, &mut portal.state, &customer, &card).await;
    report(&mut portal.state, result);
    back_home(&portal).await
}

async fn run_confirm(
    state: &AppState,
    session: &mut PortalSession,
    customer: &CustomerIdentity,
    card: &CardForm,
) -> std::result::Result<(), ActionError> {
    let (date, summary) = session
        .navigator
        .date_wizard()
        .ok_or(FlowError::InvalidAction)?
        .confirm_request(card, today())?;

    let subscription = require_current(state, customer).await?;
    let update = SubscriptionUpdate {
        next_charge_date: Some(date),
        ..SubscriptionUpdate::default()
    };
    state
        .culto()
        .update_subscription(&subscription.id, &update)
        .await
        .map_err(upstream(UPDATE_FAILED))?;

    add_breadcrumb(
        "date",
        "Next charge date updated",
        Some(&[("subscription_id", subscription.id.as_str())]),
    );
    tracing::info!(
        customer_id = %customer.id,
        subscription_id = %subscription.id,
        next_charge_date = %date,
        "Next charge date updated"
    );

    session.card = Some(summary.clone());
    if let Some(wizard) = session.navigator.date_wizard() {
        wizard.mark_confirmed(date, summary);
    }
    Ok(())
}

fn with_wizard(
    session: &mut PortalSession,
    f: impl FnOnce(&mut DateWizard) -> std::result::Result<(), FlowError>,
) -> std::result::Result<(), ActionError> {
    let wizard = session
        .navigator
        .date_wizard()
        .ok_or(FlowError::InvalidAction)?;
    Ok(f(wizard)?)
}
