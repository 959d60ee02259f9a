//! Modify-delivery wizard handlers, plus the delivery form shared with the
//! reactivation overlay.

use axum::{Form, extract::State, response::Redirect};
use serde::Deserialize;
use tracing::instrument;

use culto_portal_core::catalog::{BARRIOS, CODIGOS_POSTALES, DEPARTAMENTOS, DeliveryOption, STORES};
use culto_portal_core::flow::{
    AddressForm, DeliverySelection, DeliveryStep, DeliveryWizard, FlowError, Overlay,
};

use super::{ActionError, back_home, load_current, report, require_current, upstream};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Portal;
use crate::models::{CustomerIdentity, PortalSession};
use crate::state::AppState;

const UPDATE_FAILED: &str = "No pudimos actualizar la entrega. Probá de nuevo.";

// =============================================================================
// View Models
// =============================================================================

#[derive(Debug, Clone)]
pub struct StoreOption {
    pub id: &'static str,
    pub name: &'static str,
    pub address: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: &'static str,
    pub selected: bool,
}

fn select_options(values: &[&'static str], current: &str) -> Vec<SelectOption> {
    values
        .iter()
        .map(|&value| SelectOption {
            value,
            selected: value == current,
        })
        .collect()
}

/// The envío/retiro form and its summary card.
#[derive(Debug, Clone)]
pub struct DeliveryFormView {
    pub is_envio: bool,
    pub stores: Vec<StoreOption>,
    pub address: AddressForm,
    pub departamentos: Vec<SelectOption>,
    pub barrios: Vec<SelectOption>,
    pub codigos_postales: Vec<SelectOption>,
    pub summary_label: &'static str,
    pub summary_detail: String,
    pub footnote: &'static str,
}

impl DeliveryFormView {
    #[must_use]
    pub fn new(selection: &DeliverySelection) -> Self {
        let (summary_label, summary_detail) = selection.summary();
        let address = &selection.address;
        Self {
            is_envio: selection.option == DeliveryOption::Envio,
            stores: STORES
                .iter()
                .map(|s| StoreOption {
                    id: s.id,
                    name: s.name,
                    address: s.address,
                    selected: s.id == selection.store_id,
                })
                .collect(),
            departamentos: select_options(&DEPARTAMENTOS, &address.departamento),
            barrios: select_options(&BARRIOS, &address.barrio),
            codigos_postales: select_options(&CODIGOS_POSTALES, &address.codigo_postal),
            address: address.clone(),
            summary_label,
            summary_detail,
            footnote: selection.footnote(),
        }
    }
}

/// Display data for the modify-delivery overlay.
#[derive(Debug, Clone)]
pub struct DeliveryView {
    /// `edit` or `confirm`
    pub step: &'static str,
    pub title: &'static str,
    pub form: DeliveryFormView,
}

impl DeliveryView {
    #[must_use]
    pub fn new(wizard: &DeliveryWizard) -> Self {
        Self {
            step: match wizard.step() {
                DeliveryStep::Edit => "edit",
                DeliveryStep::Confirm => "confirm",
            },
            title: wizard.title(),
            form: DeliveryFormView::new(wizard.selection()),
        }
    }

    /// The form the template binds, shared with the reactivation screen.
    #[must_use]
    pub const fn delivery_form(&self) -> Option<&DeliveryFormView> {
        Some(&self.form)
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Envío/retiro radio switch.
#[derive(Debug, Deserialize)]
pub struct OptionForm {
    pub option: DeliveryOption,
}

/// The full delivery form.
#[derive(Debug, Deserialize)]
pub struct DeliveryForm {
    pub option: DeliveryOption,
    #[serde(default)]
    pub store_id: Option<String>,
    #[serde(default)]
    pub departamento: String,
    #[serde(default)]
    pub direccion: String,
    #[serde(default)]
    pub apartamento: String,
    #[serde(default)]
    pub barrio: String,
    #[serde(default)]
    pub codigo_postal: String,
}

impl DeliveryForm {
    /// Split into what [`DeliverySelection::update`] takes. The address is
    /// only kept for envío so a pickup post cannot wipe it.
    #[must_use]
    pub fn into_parts(self) -> (DeliveryOption, Option<String>, Option<AddressForm>) {
        let store_id = self.store_id.filter(|id| !id.trim().is_empty());
        let address = (self.option == DeliveryOption::Envio).then(|| AddressForm {
            departamento: self.departamento,
            direccion: self.direccion,
            apartamento: self.apartamento,
            barrio: self.barrio,
            codigo_postal: self.codigo_postal,
        });
        (self.option, store_id, address)
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// "Modificar entrega": seed the form from the current subscription.
#[instrument(skip(state, portal))]
pub async fn open(State(state): State<AppState>, mut portal: Portal) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    match load_current(&state, &customer).await {
        Ok(current) => portal
            .state
            .navigator
            .open_overlay(Overlay::ModifyDelivery(DeliveryWizard::new(current.as_ref()))),
        Err(e) => portal.state.flash_error(e.to_string()),
    }
    back_home(&portal).await
}

/// Switch envío/retiro.
#[instrument(skip(portal))]
pub async fn option(mut portal: Portal, Form(form): Form<OptionForm>) -> Result<Redirect> {
    portal.customer()?;
    let result = portal
        .state
        .navigator
        .delivery_wizard()
        .map(|w| w.select_option(form.option))
        .ok_or(FlowError::InvalidAction);
    report(&mut portal.state, result.map_err(Into::into));
    back_home(&portal).await
}

/// "Confirmar entrega": PATCH the delivery fields.
#[instrument(skip(state, portal, form))]
pub async fn confirm(
    State(state): State<AppState>,
    mut portal: Portal,
    Form(form): Form<DeliveryForm>,
) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    let result = run_confirm(&state, &mut portal.state, &customer, form).await;
    report(&mut portal.state, result);
    back_home(&portal).await
}

async fn run_confirm(
    state: &AppState,
    session: &mut PortalSession,
    customer: &CustomerIdentity,
    form: DeliveryForm,
) -> std::result::Result<(), ActionError> {
    let (option, store_id, address) = form.into_parts();
    let update = session
        .navigator
        .delivery_wizard()
        .ok_or(FlowError::InvalidAction)?
        .confirm_request(option, store_id.as_deref(), address)?;

    let subscription = require_current(state, customer).await?;
    state
        .culto()
        .update_subscription(&subscription.id, &update)
        .await
        .map_err(upstream(UPDATE_FAILED))?;

    let method = update.delivery_method.map(|m| m.label()).unwrap_or_default();
    add_breadcrumb(
        "delivery",
        "Delivery updated",
        Some(&[
            ("subscription_id", subscription.id.as_str()),
            ("delivery_method", method),
        ]),
    );
    tracing::info!(
        customer_id = %customer.id,
        subscription_id = %subscription.id,
        delivery_method = method,
        "Delivery updated"
    );

    if let Some(wizard) = session.navigator.delivery_wizard() {
        wizard.mark_confirmed();
    }
    Ok(())
}
