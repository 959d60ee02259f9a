//! Modify-plan wizard handlers.

use axum::{Form, extract::State, response::Redirect};
use serde::Deserialize;
use tracing::instrument;

use culto_portal_core::catalog::{GRINDS, PLANS, QUANTITIES};
use culto_portal_core::flow::{FlowError, Overlay, PlanStep, PlanWizard};

use super::{ActionError, back_home, load_current, report, require_current, upstream};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Portal;
use crate::models::{CustomerIdentity, PortalSession};
use crate::state::AppState;

const PRICES_FAILED: &str = "No pudimos cargar los precios. Probá de nuevo en unos minutos.";
const UPDATE_FAILED: &str = "No pudimos actualizar tu plan. Probá de nuevo.";

// =============================================================================
// View Models
// =============================================================================

#[derive(Debug, Clone)]
pub struct PlanOption {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct QuantityOption {
    pub bags: u32,
    pub label: &'static str,
    pub description: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct GrindOption {
    pub label: &'static str,
    pub description: &'static str,
    pub selected: bool,
}

/// Display data for the modify-plan overlay.
#[derive(Debug, Clone)]
pub struct PlanView {
    /// `step-1`, `step-2`, `step-3` or `step-confirm`
    pub step: &'static str,
    pub title: &'static str,
    pub step_label: Option<String>,
    pub confirmed_title: &'static str,
    pub skips_plan_selection: bool,
    pub plans: Vec<PlanOption>,
    pub quantities: Vec<QuantityOption>,
    pub grinds: Vec<GrindOption>,
    pub plan_name: &'static str,
    pub quantity_label: &'static str,
    pub grind_label: &'static str,
}

const fn step_id(step: PlanStep) -> &'static str {
    match step {
        PlanStep::Plan => "step-1",
        PlanStep::Configure => "step-2",
        PlanStep::Review => "step-3",
        PlanStep::Confirmed => "step-confirm",
    }
}

impl PlanView {
    #[must_use]
    pub fn new(wizard: &PlanWizard) -> Self {
        let plan = wizard.plan();
        let quantity = wizard.quantity();
        let grind = wizard.grind();

        Self {
            step: step_id(wizard.step()),
            title: wizard.title(),
            step_label: wizard.step_label(),
            confirmed_title: wizard.confirmed_title(),
            skips_plan_selection: wizard.skips_plan_selection(),
            plans: PLANS
                .iter()
                .map(|p| PlanOption {
                    id: p.id,
                    name: p.name,
                    description: p.description,
                    selected: plan.is_some_and(|selected| selected.id == p.id),
                })
                .collect(),
            quantities: QUANTITIES
                .iter()
                .map(|q| QuantityOption {
                    bags: q.bags,
                    label: q.label,
                    description: q.description,
                    selected: q.bags == quantity.bags,
                })
                .collect(),
            grinds: GRINDS
                .iter()
                .map(|g| GrindOption {
                    label: g.label,
                    description: g.description.unwrap_or_default(),
                    selected: g.label == grind.label,
                })
                .collect(),
            plan_name: plan.map_or("", |p| p.name),
            quantity_label: quantity.label,
            grind_label: grind.label,
        }
    }
}

// =============================================================================
// Forms
// =============================================================================

/// Which button opened the wizard.
#[derive(Debug, Deserialize)]
pub struct OpenForm {
    /// `modify` skips plan selection; anything else starts at the plan list.
    #[serde(default)]
    pub mode: String,
}

#[derive(Debug, Deserialize)]
pub struct SelectForm {
    #[serde(default)]
    pub plan_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConfigureForm {
    pub bags: u32,
    pub grind: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// "Modificar plan", "Cambiar de plan", "Elegir un nuevo plan", "Ver planes".
#[instrument(skip(state, portal))]
pub async fn open(
    State(state): State<AppState>,
    mut portal: Portal,
    Form(form): Form<OpenForm>,
) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    let current = load_current(&state, &customer).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Opening plan wizard without the current subscription");
        None
    });
    let skip = form.mode == "modify";
    portal
        .state
        .navigator
        .open_overlay(Overlay::ModifyPlan(PlanWizard::new(skip, current.as_ref())));
    back_home(&portal).await
}

/// Highlight a plan on step 1.
#[instrument(skip(portal))]
pub async fn select(mut portal: Portal, Form(form): Form<SelectForm>) -> Result<Redirect> {
    portal.customer()?;
    let result = with_wizard(&mut portal.state, |w| match form.plan_id.as_deref() {
        Some(id) => w.select_plan(id),
        None => Err(FlowError::PlanRequired),
    });
    report(&mut portal.state, result);
    back_home(&portal).await
}

/// "Continuar" on step 1. The form may carry the plan radio.
#[instrument(skip(portal))]
pub async fn configure(mut portal: Portal, Form(form): Form<SelectForm>) -> Result<Redirect> {
    portal.customer()?;
    let result = with_wizard(&mut portal.state, |w| {
        if let Some(id) = form.plan_id.as_deref() {
            w.select_plan(id)?;
        }
        w.continue_to_configure()
    });
    report(&mut portal.state, result);
    back_home(&portal).await
}

/// "Continuar" on step 2.
#[instrument(skip(portal))]
pub async fn review(mut portal: Portal, Form(form): Form<ConfigureForm>) -> Result<Redirect> {
    portal.customer()?;
    let result = with_wizard(&mut portal.state, |w| w.configure(form.bags, &form.grind));
    report(&mut portal.state, result);
    back_home(&portal).await
}

/// "Confirmar cambio": resolve the price and PATCH the subscription.
#[instrument(skip(state, portal))]
pub async fn confirm(State(state): State<AppState>, mut portal: Portal) -> Result<Redirect> {
    let customer = portal.customer()?.clone();
    let result = run_confirm(&state, &mut portal.state, &customer).await;
    report(&mut portal.state, result);
    back_home(&portal).await
}

async fn run_confirm(
    state: &AppState,
    session: &mut PortalSession,
    customer: &CustomerIdentity,
) -> std::result::Result<(), ActionError> {
    let prices = state
        .culto()
        .prices()
        .await
        .map_err(upstream(PRICES_FAILED))?;
    let update = session
        .navigator
        .plan_wizard()
        .ok_or(FlowError::InvalidAction)?
        .confirm_request(&prices)?;

    let subscription = require_current(state, customer).await?;
    state
        .culto()
        .update_subscription(&subscription.id, &update)
        .await
        .map_err(upstream(UPDATE_FAILED))?;

    add_breadcrumb(
        "plan",
        "Plan updated",
        Some(&[("subscription_id", subscription.id.as_str())]),
    );
    tracing::info!(
        customer_id = %customer.id,
        subscription_id = %subscription.id,
        price_id = update.price_id.as_deref().unwrap_or_default(),
        "Plan updated"
    );

    if let Some(wizard) = session.navigator.plan_wizard() {
        wizard.mark_confirmed();
    }
    Ok(())
}

fn with_wizard(
    session: &mut PortalSession,
    f: impl FnOnce(&mut PlanWizard) -> std::result::Result<(), FlowError>,
) -> std::result::Result<(), ActionError> {
    let wizard = session
        .navigator
        .plan_wizard()
        .ok_or(FlowError::InvalidAction)?;
    Ok(f(wizard)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_in_new_plan_mode() {
        let view = PlanView::new(&PlanWizard::new(false, None));
        assert_eq!(view.step, "step-1");
        assert_eq!(view.title, "NUEVO PLAN");
        assert_eq!(view.step_label.as_deref(), Some("Paso 1 de 3"));
        assert_eq!(view.plans.len(), 5);
        assert!(view.plans.iter().all(|p| !p.selected));
        assert_eq!(view.plan_name, "");
    }

    #[test]
    fn test_view_in_skip_mode_defaults() {
        let view = PlanView::new(&PlanWizard::new(true, None));
        assert_eq!(view.step, "step-2");
        assert_eq!(view.title, "MODIFICAR PLAN");
        assert_eq!(view.plan_name, "Plan Brasil");
        assert_eq!(view.quantity_label, "2 bolsas de 250 g");
        assert_eq!(view.grind_label, "En grano");
        assert_eq!(view.quantities.iter().filter(|q| q.selected).count(), 1);
        assert_eq!(view.grinds.iter().filter(|g| g.selected).count(), 1);
    }

    #[test]
    fn test_with_wizard_requires_open_overlay() {
        let mut session = PortalSession::default();
        let result = with_wizard(&mut session, PlanWizard::continue_to_configure);
        assert!(matches!(result, Err(ActionError::Flow(FlowError::InvalidAction))));

        session
            .navigator
            .open_overlay(Overlay::ModifyPlan(PlanWizard::new(false, None)));
        let result = with_wizard(&mut session, PlanWizard::continue_to_configure);
        assert!(matches!(result, Err(ActionError::Flow(FlowError::PlanRequired))));

        let result = with_wizard(&mut session, |w| {
            w.select_plan("mix")?;
            w.continue_to_configure()
        });
        assert!(result.is_ok());
    }
}
