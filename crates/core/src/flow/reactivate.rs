//! Reactivation wizard, as a dashboard overlay and as the standalone page.
//!
//! Overlay: reactivar → delivery → confirm (keep-date) or payment →
//! payment-confirm (charge-now). The standalone page has no delivery step.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::delivery::{AddressForm, DeliverySelection};
use super::{BackOutcome, FlowError};
use crate::catalog::DeliveryOption;
use crate::types::{Subscription, SubscriptionStatus, SubscriptionUpdate};
use crate::validation::{CardForm, CardSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReactivateOption {
    /// "Recibir mi café antes": pay today.
    #[default]
    ChargeNow,
    /// "Mantener mi fecha original".
    KeepDate,
}

impl std::str::FromStr for ReactivateOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "charge-now" => Ok(Self::ChargeNow),
            "keep-date" => Ok(Self::KeepDate),
            _ => Err(format!("invalid reactivation option: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ReactivateStep {
    #[default]
    Reactivar,
    Delivery,
    Payment,
    Confirm,
    PaymentConfirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactivateMode {
    Overlay,
    Standalone,
}

/// State of a reactivation in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactivateWizard {
    mode: ReactivateMode,
    step: ReactivateStep,
    option: ReactivateOption,
    delivery: Option<DeliverySelection>,
    card: Option<CardSummary>,
}

impl ReactivateWizard {
    /// Dashboard overlay, with the delivery step seeded from `current`.
    #[must_use]
    pub fn overlay(current: Option<&Subscription>) -> Self {
        Self {
            mode: ReactivateMode::Overlay,
            step: ReactivateStep::Reactivar,
            option: ReactivateOption::ChargeNow,
            delivery: Some(DeliverySelection::from_subscription(current)),
            card: None,
        }
    }

    /// The `/reactivate` page.
    #[must_use]
    pub const fn standalone() -> Self {
        Self {
            mode: ReactivateMode::Standalone,
            step: ReactivateStep::Reactivar,
            option: ReactivateOption::ChargeNow,
            delivery: None,
            card: None,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> ReactivateMode {
        self.mode
    }

    #[must_use]
    pub const fn step(&self) -> ReactivateStep {
        self.step
    }

    #[must_use]
    pub const fn option(&self) -> ReactivateOption {
        self.option
    }

    #[must_use]
    pub const fn delivery(&self) -> Option<&DeliverySelection> {
        self.delivery.as_ref()
    }

    #[must_use]
    pub const fn card(&self) -> Option<&CardSummary> {
        self.card.as_ref()
    }

    /// Header title. The standalone page names each step.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match (self.mode, self.step) {
            (ReactivateMode::Overlay, _) => "REACTIVAR PLAN",
            (ReactivateMode::Standalone, ReactivateStep::Payment) => "Método de pago",
            (
                ReactivateMode::Standalone,
                ReactivateStep::Confirm | ReactivateStep::PaymentConfirm,
            ) => "Confirmación",
            (ReactivateMode::Standalone, _) => "Reactivar plan",
        }
    }

    #[must_use]
    pub const fn total_steps(&self) -> u8 {
        let base = match self.mode {
            ReactivateMode::Overlay => 2,
            ReactivateMode::Standalone => 1,
        };
        match self.option {
            ReactivateOption::ChargeNow => base + 1,
            ReactivateOption::KeepDate => base,
        }
    }

    /// `"Paso N de M"` on the overlay's input steps.
    #[must_use]
    pub fn step_label(&self) -> Option<String> {
        if self.mode == ReactivateMode::Standalone {
            return None;
        }
        let n = match self.step {
            ReactivateStep::Reactivar => 1,
            ReactivateStep::Delivery => 2,
            ReactivateStep::Payment => 3,
            ReactivateStep::Confirm | ReactivateStep::PaymentConfirm => return None,
        };
        Some(format!("Paso {n} de {}", self.total_steps()))
    }

    /// Whether the current step shows the completion screen.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(
            self.step,
            ReactivateStep::Confirm | ReactivateStep::PaymentConfirm
        )
    }

    /// Pick charge-now or keep-date on the first step.
    pub fn select_option(&mut self, option: ReactivateOption) {
        if self.step == ReactivateStep::Reactivar {
            self.option = option;
        }
    }

    /// Switch envío/retiro on the delivery step without submitting.
    pub fn select_delivery_option(&mut self, option: DeliveryOption) {
        if self.step == ReactivateStep::Delivery
            && let Some(delivery) = self.delivery.as_mut()
        {
            delivery.option = option;
        }
    }

    fn next_after_choice(&self) -> ReactivateStep {
        match self.option {
            ReactivateOption::ChargeNow => ReactivateStep::Payment,
            ReactivateOption::KeepDate => ReactivateStep::Confirm,
        }
    }

    /// Whether continuing from the current step finishes the reactivation
    /// (and therefore needs [`Self::reactivation_request`]).
    #[must_use]
    pub fn continue_finishes(&self) -> bool {
        self.next_after_choice() == ReactivateStep::Confirm
            && match self.mode {
                ReactivateMode::Overlay => self.step == ReactivateStep::Delivery,
                ReactivateMode::Standalone => self.step == ReactivateStep::Reactivar,
            }
    }

    /// "Confirmar reactivación": move on when no API call is needed.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidAction`] when the step cannot continue without a
    /// call; use [`Self::reactivation_request`] then.
    pub fn advance(&mut self) -> Result<(), FlowError> {
        if self.continue_finishes() {
            return Err(FlowError::InvalidAction);
        }
        self.step = match (self.mode, self.step) {
            (ReactivateMode::Overlay, ReactivateStep::Reactivar) => ReactivateStep::Delivery,
            (ReactivateMode::Overlay, ReactivateStep::Delivery)
            | (ReactivateMode::Standalone, ReactivateStep::Reactivar) => self.next_after_choice(),
            _ => return Err(FlowError::InvalidAction),
        };
        Ok(())
    }

    /// Store the delivery form posted on the delivery step.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidAction`] off the delivery step; the selection's
    /// own validation errors otherwise.
    pub fn submit_delivery(
        &mut self,
        option: DeliveryOption,
        store_id: Option<&str>,
        address: Option<AddressForm>,
    ) -> Result<(), FlowError> {
        if self.step != ReactivateStep::Delivery {
            return Err(FlowError::InvalidAction);
        }
        let delivery = self.delivery.get_or_insert_with(DeliverySelection::default);
        delivery.update(option, store_id, address);
        delivery.to_update().map(|_| ())
    }

    /// Build the reactivation PATCH for the finishing step.
    ///
    /// Delivery fields are included when the delivery step ran; charge-now
    /// also moves `next_charge_date` to `today`.
    ///
    /// # Errors
    ///
    /// [`FlowError::CardIncomplete`] on the payment step without a filled card.
    pub fn reactivation_request(
        &self,
        card: Option<&CardForm>,
        today: NaiveDate,
    ) -> Result<(SubscriptionUpdate, Option<CardSummary>), FlowError> {
        let summary = match self.step {
            ReactivateStep::Payment => Some(
                card.and_then(CardForm::summary)
                    .ok_or(FlowError::CardIncomplete)?,
            ),
            _ if self.continue_finishes() => None,
            _ => return Err(FlowError::InvalidAction),
        };

        let mut update = match &self.delivery {
            Some(delivery) if self.mode == ReactivateMode::Overlay => delivery.to_update()?,
            _ => SubscriptionUpdate::default(),
        };
        update.status = Some(SubscriptionStatus::Active);
        if self.option == ReactivateOption::ChargeNow {
            update.next_charge_date = Some(today);
        }
        Ok((update, summary))
    }

    /// Move to the completion screen after the PATCH succeeded.
    pub fn mark_reactivated(&mut self, card: Option<CardSummary>) {
        self.step = if self.step == ReactivateStep::Payment {
            ReactivateStep::PaymentConfirm
        } else {
            ReactivateStep::Confirm
        };
        if card.is_some() {
            self.card = card;
        }
    }

    pub(crate) fn back(&mut self) -> BackOutcome {
        match (self.mode, self.step) {
            (_, ReactivateStep::Reactivar) => BackOutcome::Close,
            (ReactivateMode::Overlay, ReactivateStep::Delivery) => {
                self.step = ReactivateStep::Reactivar;
                BackOutcome::Moved
            }
            (ReactivateMode::Overlay, ReactivateStep::Payment) => {
                self.step = ReactivateStep::Delivery;
                BackOutcome::Moved
            }
            (ReactivateMode::Overlay, _) => BackOutcome::Ignored,
            (ReactivateMode::Standalone, _) => {
                self.step = ReactivateStep::Reactivar;
                BackOutcome::Moved
            }
        }
    }

    /// Back button on the standalone page.
    pub fn page_back(&mut self) -> BackOutcome {
        self.back()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::DeliveryMethod;
    use crate::types::subscription::tests::subscription;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn card() -> CardForm {
        CardForm {
            card_holder: "Ana".to_owned(),
            card_number: "4242424242424242".to_owned(),
            card_expiry: "1229".to_owned(),
            card_cvv: "123".to_owned(),
        }
    }

    fn paused_pickup() -> Subscription {
        let mut sub = subscription(SubscriptionStatus::Paused);
        sub.delivery_method = DeliveryMethod::Pickup;
        sub.pickup_location = Some("Ciudad Vieja".to_owned());
        sub
    }

    #[test]
    fn test_overlay_step_labels() {
        let mut wizard = ReactivateWizard::overlay(None);
        assert_eq!(wizard.title(), "REACTIVAR PLAN");
        assert_eq!(wizard.step_label().as_deref(), Some("Paso 1 de 3"));

        wizard.select_option(ReactivateOption::KeepDate);
        assert_eq!(wizard.step_label().as_deref(), Some("Paso 1 de 2"));

        wizard.advance().unwrap();
        assert_eq!(wizard.step(), ReactivateStep::Delivery);
        assert_eq!(wizard.step_label().as_deref(), Some("Paso 2 de 2"));
    }

    #[test]
    fn test_overlay_keep_date_finishes_from_delivery() {
        let sub = paused_pickup();
        let mut wizard = ReactivateWizard::overlay(Some(&sub));
        wizard.select_option(ReactivateOption::KeepDate);
        wizard.advance().unwrap();

        assert!(wizard.continue_finishes());
        assert_eq!(wizard.advance(), Err(FlowError::InvalidAction));

        let (update, card) = wizard.reactivation_request(None, today()).unwrap();
        assert_eq!(update.status, Some(SubscriptionStatus::Active));
        assert_eq!(update.pickup_location, Some(Some("Ciudad Vieja".to_owned())));
        assert_eq!(update.next_charge_date, None);
        assert!(card.is_none());

        wizard.mark_reactivated(None);
        assert_eq!(wizard.step(), ReactivateStep::Confirm);
        assert_eq!(wizard.back(), BackOutcome::Ignored);
    }

    #[test]
    fn test_overlay_charge_now_goes_through_payment() {
        let mut wizard = ReactivateWizard::overlay(Some(&paused_pickup()));
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.step(), ReactivateStep::Payment);
        assert_eq!(wizard.step_label().as_deref(), Some("Paso 3 de 3"));

        assert_eq!(
            wizard.reactivation_request(Some(&CardForm::default()), today()),
            Err(FlowError::CardIncomplete)
        );

        let (update, summary) = wizard.reactivation_request(Some(&card()), today()).unwrap();
        assert_eq!(update.next_charge_date, Some(today()));
        assert_eq!(update.status, Some(SubscriptionStatus::Active));

        wizard.mark_reactivated(summary);
        assert_eq!(wizard.step(), ReactivateStep::PaymentConfirm);
        assert_eq!(wizard.card().unwrap().display(), "Visa •••• 4242");
        assert_eq!(wizard.back(), BackOutcome::Ignored);
    }

    #[test]
    fn test_overlay_back_rules() {
        let mut wizard = ReactivateWizard::overlay(None);
        wizard.advance().unwrap();
        wizard.advance().unwrap();
        assert_eq!(wizard.back(), BackOutcome::Moved);
        assert_eq!(wizard.step(), ReactivateStep::Delivery);
        assert_eq!(wizard.back(), BackOutcome::Moved);
        assert_eq!(wizard.step(), ReactivateStep::Reactivar);
        assert_eq!(wizard.back(), BackOutcome::Close);
    }

    #[test]
    fn test_overlay_delivery_validation() {
        let mut wizard = ReactivateWizard::overlay(None);
        wizard.advance().unwrap();
        assert_eq!(
            wizard.submit_delivery(DeliveryOption::Envio, None, Some(AddressForm::default())),
            Err(FlowError::AddressIncomplete)
        );
        assert!(
            wizard
                .submit_delivery(DeliveryOption::Retiro, Some("epa"), None)
                .is_ok()
        );
    }

    #[test]
    fn test_standalone_has_no_delivery_step() {
        let mut wizard = ReactivateWizard::standalone();
        assert_eq!(wizard.title(), "Reactivar plan");
        wizard.advance().unwrap();
        assert_eq!(wizard.step(), ReactivateStep::Payment);
        assert_eq!(wizard.title(), "Método de pago");

        let (update, _) = wizard.reactivation_request(Some(&card()), today()).unwrap();
        assert!(update.delivery_method.is_none());
        assert!(update.pickup_location.is_none());
    }

    #[test]
    fn test_standalone_keep_date_finishes_immediately() {
        let mut wizard = ReactivateWizard::standalone();
        wizard.select_option(ReactivateOption::KeepDate);
        assert!(wizard.continue_finishes());

        let (update, _) = wizard.reactivation_request(None, today()).unwrap();
        assert_eq!(update.status, Some(SubscriptionStatus::Active));
        wizard.mark_reactivated(None);
        assert_eq!(wizard.title(), "Confirmación");
    }

    #[test]
    fn test_standalone_back_returns_to_start() {
        let mut wizard = ReactivateWizard::standalone();
        wizard.advance().unwrap();
        assert_eq!(wizard.page_back(), BackOutcome::Moved);
        assert_eq!(wizard.step(), ReactivateStep::Reactivar);

        wizard.select_option(ReactivateOption::KeepDate);
        wizard.mark_reactivated(None);
        assert_eq!(wizard.page_back(), BackOutcome::Moved);
        assert_eq!(wizard.step(), ReactivateStep::Reactivar);
    }

    #[test]
    fn test_option_locked_after_first_step() {
        let mut wizard = ReactivateWizard::overlay(None);
        wizard.advance().unwrap();
        wizard.select_option(ReactivateOption::KeepDate);
        assert_eq!(wizard.option(), ReactivateOption::ChargeNow);
    }
}
