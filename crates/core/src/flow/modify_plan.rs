//! Modify-plan wizard: plan → quantity and grind → summary → confirmed.

use serde::{Deserialize, Serialize};

use super::{BackOutcome, FlowError};
use crate::catalog::{self, Grind, Plan, Quantity};
use crate::types::{Price, Subscription, SubscriptionUpdate, api_grinding_type, grind_label};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlanStep {
    #[default]
    #[serde(rename = "step-1")]
    Plan,
    #[serde(rename = "step-2")]
    Configure,
    #[serde(rename = "step-3")]
    Review,
    #[serde(rename = "step-confirm")]
    Confirmed,
}

/// State of the modify-plan overlay.
///
/// In skip mode ("Modificar plan") the plan is fixed to the current one and
/// the wizard starts at the quantity step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanWizard {
    skip_plan_selection: bool,
    step: PlanStep,
    plan_id: Option<String>,
    bags: u32,
    grind: String,
}

impl PlanWizard {
    /// Open the wizard, seeding quantity and grind from `current`.
    #[must_use]
    pub fn new(skip_plan_selection: bool, current: Option<&Subscription>) -> Self {
        let bags = current
            .and_then(|s| catalog::quantity(s.price.bag_amount))
            .unwrap_or(catalog::DEFAULT_QUANTITY)
            .bags;
        let grind = current
            .map(|s| grind_label(&s.grinding_type))
            .filter(|label| catalog::grind(label).is_some())
            .unwrap_or_else(|| catalog::DEFAULT_GRIND.label.to_owned());

        let (step, plan_id) = if skip_plan_selection {
            let plan = current
                .and_then(|s| catalog::plan_by_name(&s.plan_name()))
                .unwrap_or(catalog::DEFAULT_PLAN);
            (PlanStep::Configure, Some(plan.id.to_owned()))
        } else {
            (PlanStep::Plan, None)
        };

        Self {
            skip_plan_selection,
            step,
            plan_id,
            bags,
            grind,
        }
    }

    #[must_use]
    pub const fn step(&self) -> PlanStep {
        self.step
    }

    #[must_use]
    pub const fn skips_plan_selection(&self) -> bool {
        self.skip_plan_selection
    }

    #[must_use]
    pub fn plan(&self) -> Option<Plan> {
        self.plan_id.as_deref().and_then(catalog::plan_by_id)
    }

    #[must_use]
    pub fn quantity(&self) -> Quantity {
        catalog::quantity(self.bags).unwrap_or(catalog::DEFAULT_QUANTITY)
    }

    #[must_use]
    pub fn grind(&self) -> Grind {
        catalog::grind(&self.grind).unwrap_or(catalog::DEFAULT_GRIND)
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        if self.skip_plan_selection {
            "MODIFICAR PLAN"
        } else {
            "NUEVO PLAN"
        }
    }

    #[must_use]
    pub const fn total_steps(&self) -> u8 {
        if self.skip_plan_selection { 2 } else { 3 }
    }

    /// `"Paso N de M"`, or `None` on the confirmation screen.
    #[must_use]
    pub fn step_label(&self) -> Option<String> {
        let n = match (self.step, self.skip_plan_selection) {
            (PlanStep::Plan, _) | (PlanStep::Configure, true) => 1,
            (PlanStep::Configure, false) | (PlanStep::Review, true) => 2,
            (PlanStep::Review, false) => 3,
            (PlanStep::Confirmed, _) => return None,
        };
        Some(format!("Paso {n} de {}", self.total_steps()))
    }

    /// Heading of the confirmation screen.
    #[must_use]
    pub const fn confirmed_title(&self) -> &'static str {
        if self.skip_plan_selection {
            "¡Plan actualizado!"
        } else {
            "¡Cambio confirmado!"
        }
    }

    /// Highlight a plan on step 1.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidAction`] off step 1; [`FlowError::PlanRequired`]
    /// for an unknown plan id.
    pub fn select_plan(&mut self, plan_id: &str) -> Result<(), FlowError> {
        if self.step != PlanStep::Plan {
            return Err(FlowError::InvalidAction);
        }
        let plan = catalog::plan_by_id(plan_id).ok_or(FlowError::PlanRequired)?;
        self.plan_id = Some(plan.id.to_owned());
        Ok(())
    }

    /// Step 1 → step 2.
    ///
    /// # Errors
    ///
    /// [`FlowError::PlanRequired`] when no plan is selected.
    pub fn continue_to_configure(&mut self) -> Result<(), FlowError> {
        if self.step != PlanStep::Plan {
            return Err(FlowError::InvalidAction);
        }
        if self.plan().is_none() {
            return Err(FlowError::PlanRequired);
        }
        self.step = PlanStep::Configure;
        Ok(())
    }

    /// Step 2 → step 3 with the chosen quantity and grind.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidAction`] off step 2 or for values outside the catalog.
    pub fn configure(&mut self, bags: u32, grind: &str) -> Result<(), FlowError> {
        if self.step != PlanStep::Configure {
            return Err(FlowError::InvalidAction);
        }
        let quantity = catalog::quantity(bags).ok_or(FlowError::InvalidAction)?;
        let grind = catalog::grind(grind).ok_or(FlowError::InvalidAction)?;
        self.bags = quantity.bags;
        grind.label.clone_into(&mut self.grind);
        self.step = PlanStep::Review;
        Ok(())
    }

    /// Build the PATCH for the selected plan, quantity and grind.
    ///
    /// # Errors
    ///
    /// [`FlowError::NoMatchingPrice`] when no Culto price has the plan name
    /// and bag amount.
    pub fn confirm_request(&self, prices: &[Price]) -> Result<SubscriptionUpdate, FlowError> {
        if self.step != PlanStep::Review {
            return Err(FlowError::InvalidAction);
        }
        let plan = self.plan().ok_or(FlowError::PlanRequired)?;
        let price = prices
            .iter()
            .find(|p| p.plan_name() == plan.name && p.bag_amount == self.bags)
            .ok_or_else(|| FlowError::NoMatchingPrice {
                plan: plan.name.to_owned(),
                bags: self.bags,
            })?;

        Ok(SubscriptionUpdate {
            price_id: Some(price.id.clone()),
            shopify_variant_id: Some(price.shopify_product_id.clone()),
            grinding_type: Some(api_grinding_type(&self.grind)),
            ..SubscriptionUpdate::default()
        })
    }

    /// Move to the confirmation screen after the PATCH succeeded.
    pub fn mark_confirmed(&mut self) {
        self.step = PlanStep::Confirmed;
    }

    pub(super) fn back(&mut self) -> BackOutcome {
        match self.step {
            PlanStep::Plan => BackOutcome::Close,
            PlanStep::Configure if self.skip_plan_selection => BackOutcome::Close,
            PlanStep::Configure => {
                self.step = PlanStep::Plan;
                BackOutcome::Moved
            }
            PlanStep::Review => {
                self.step = PlanStep::Configure;
                BackOutcome::Moved
            }
            PlanStep::Confirmed => {
                self.step = PlanStep::Review;
                BackOutcome::Moved
            }
        }
    }
}
