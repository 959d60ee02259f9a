//! View routing for the subscription dashboard.
//!
//! The [`Navigator`] is the per-visitor routing state: which screen is shown,
//! which overlay wizard (if any) sits on top of it, and the cancellation
//! funnel's selections. It is serialized into the visitor's session between
//! requests.
//!
//! Transitions that need a Culto API call are split in two: a pure method
//! validates the input and returns the request payload, and a second method
//! commits the new step once the call succeeded. A failed call leaves the
//! navigator where it was.

pub mod cancel;
pub mod delivery;
pub mod modify_date;
pub mod modify_plan;
pub mod payment;
pub mod profile;
pub mod reactivate;

use serde::{Deserialize, Serialize};

use crate::types::{CancellationReason, Subscription, SubscriptionStatus};

pub use cancel::{CancelAction, CancelCommand, CancelStep};
pub use delivery::{AddressForm, DeliverySelection, DeliveryStep, DeliveryWizard};
pub use modify_date::{Billing, CalendarDay, DateStep, DateWizard, next_charge_date};
pub use modify_plan::{PlanStep, PlanWizard};
pub use payment::PaymentMethodState;
pub use profile::{PhoneStatus, PhoneVerification, ProfileErrors, ProfileForm};
pub use reactivate::{ReactivateMode, ReactivateOption, ReactivateStep, ReactivateWizard};

/// Guard failures. The `Display` text is shown to the customer as a banner.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Elegí un motivo para continuar.")]
    ReasonRequired,

    #[error("Elegí un plan para continuar.")]
    PlanRequired,

    #[error("Elegí una fecha para continuar.")]
    DayRequired,

    #[error("Ese día no se puede elegir.")]
    DayNotSelectable,

    #[error("Completá los datos de la tarjeta para continuar.")]
    CardIncomplete,

    #[error("Completá departamento, dirección, barrio y código postal.")]
    AddressIncomplete,

    #[error("Elegí un local para retirar tu café.")]
    StoreRequired,

    #[error("No encontramos un precio para {plan} con {bags} bolsas.")]
    NoMatchingPrice { plan: String, bags: u32 },

    #[error("{0}")]
    InvalidField(&'static str),

    #[error("Podés volver a reenviar el código en {seconds} segundos.")]
    ResendCooldown { seconds: i64 },

    #[error("No encontramos una suscripción para modificar.")]
    NoSubscription,

    #[error("Esta acción no está disponible en este paso.")]
    InvalidAction,
}

/// Result of pressing "back" inside a wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackOutcome {
    /// The wizard moved to an earlier step.
    Moved,
    /// The wizard has no earlier step and should be closed.
    Close,
    /// Back is not available on this step.
    Ignored,
}

/// The dashboard's top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViewType {
    #[default]
    Main,
    Orders,
    Data,
    Benefits,
    PaymentMethod,
    CancelReason,
    CancelOffer,
    CancelConfirm,
    CancelSuccess,
    BenefitSuccess,
}

impl ViewType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "MAIN",
            Self::Orders => "ORDERS",
            Self::Data => "DATA",
            Self::Benefits => "BENEFITS",
            Self::PaymentMethod => "PAYMENT_METHOD",
            Self::CancelReason => "CANCEL_REASON",
            Self::CancelOffer => "CANCEL_OFFER",
            Self::CancelConfirm => "CANCEL_CONFIRM",
            Self::CancelSuccess => "CANCEL_SUCCESS",
            Self::BenefitSuccess => "BENEFIT_SUCCESS",
        }
    }

    /// Whether this view is one of the navigation tabs.
    #[must_use]
    pub fn is_tab(self) -> bool {
        TABS.iter().any(|t| t.view == self)
    }

    /// Tab views other than MAIN get a close button back to MAIN.
    #[must_use]
    pub fn shows_close(self) -> bool {
        self.is_tab() && self != Self::Main
    }

    /// Header title for the page wrapper.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::CancelReason | Self::CancelOffer | Self::CancelConfirm | Self::BenefitSuccess => {
                "Cancelar suscripción"
            }
            Self::CancelSuccess => "Suscripción cancelada",
            _ => "MI CUENTA",
        }
    }
}

impl std::fmt::Display for ViewType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ViewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Main,
            Self::Orders,
            Self::Data,
            Self::Benefits,
            Self::PaymentMethod,
            Self::CancelReason,
            Self::CancelOffer,
            Self::CancelConfirm,
            Self::CancelSuccess,
            Self::BenefitSuccess,
        ]
        .into_iter()
        .find(|v| v.as_str() == s)
        .ok_or_else(|| format!("invalid view: {s}"))
    }
}

/// A navigation tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tab {
    pub view: ViewType,
    pub label: &'static str,
}

pub const TABS: [Tab; 5] = [
    Tab {
        view: ViewType::Main,
        label: "Mi suscripción",
    },
    Tab {
        view: ViewType::Orders,
        label: "Pedidos",
    },
    Tab {
        view: ViewType::Benefits,
        label: "Beneficios",
    },
    Tab {
        view: ViewType::Data,
        label: "Datos",
    },
    Tab {
        view: ViewType::PaymentMethod,
        label: "Método de pago",
    },
];

/// A wizard drawn over the dashboard. At most one is open at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    ModifyPlan(PlanWizard),
    ModifyDate(DateWizard),
    ModifyDelivery(DeliveryWizard),
    Reactivate(ReactivateWizard),
}

/// Per-visitor routing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Navigator {
    view: ViewType,
    overlay: Option<Overlay>,
    cancel_reason: Option<CancellationReason>,
    offer_eligible: bool,
}

impl Navigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The underlying view (ignores any open overlay).
    #[must_use]
    pub const fn view(&self) -> ViewType {
        self.view
    }

    /// The open overlay, which takes priority over the view.
    #[must_use]
    pub const fn overlay(&self) -> Option<&Overlay> {
        self.overlay.as_ref()
    }

    pub const fn overlay_mut(&mut self) -> Option<&mut Overlay> {
        self.overlay.as_mut()
    }

    #[must_use]
    pub const fn cancel_reason(&self) -> Option<CancellationReason> {
        self.cancel_reason
    }

    #[must_use]
    pub const fn offer_eligible(&self) -> bool {
        self.offer_eligible
    }

    /// Whether the tab bar is drawn: only on tab views with no overlay open.
    #[must_use]
    pub fn shows_tabs(&self) -> bool {
        self.overlay.is_none() && self.view.is_tab()
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        self.view.title()
    }

    /// Switch to a tab view. Closes any overlay.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidAction`] for views that are only reachable
    /// through the cancellation funnel.
    pub fn show_tab(&mut self, view: ViewType) -> Result<(), FlowError> {
        if !view.is_tab() {
            return Err(FlowError::InvalidAction);
        }
        self.overlay = None;
        self.view = view;
        Ok(())
    }

    /// Back to MAIN, dropping any overlay and funnel selection.
    pub fn go_main(&mut self) {
        self.overlay = None;
        self.view = ViewType::Main;
        self.cancel_reason = None;
    }

    fn tab_index(&self) -> Option<usize> {
        TABS.iter().position(|t| t.view == self.view)
    }

    /// Swipe left. Stops at the last tab; ignored off the tab bar.
    pub fn next_tab(&mut self) {
        if self.overlay.is_some() {
            return;
        }
        if let Some(next) = self.tab_index().and_then(|i| TABS.get(i + 1)) {
            self.view = next.view;
        }
    }

    /// Swipe right. Stops at the first tab; ignored off the tab bar.
    pub fn prev_tab(&mut self) {
        if self.overlay.is_some() {
            return;
        }
        if let Some(prev) = self
            .tab_index()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| TABS.get(i))
        {
            self.view = prev.view;
        }
    }

    /// Open an overlay, replacing any other.
    pub fn open_overlay(&mut self, overlay: Overlay) {
        self.overlay = Some(overlay);
    }

    /// Close the overlay, revealing the underlying view.
    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    /// Press "back" in the open overlay; closes it when it has no earlier step.
    pub fn overlay_back(&mut self) {
        let outcome = match self.overlay.as_mut() {
            None => return,
            Some(Overlay::ModifyPlan(w)) => w.back(),
            Some(Overlay::ModifyDate(w)) => w.back(),
            Some(Overlay::ModifyDelivery(w)) => w.back(),
            Some(Overlay::Reactivate(w)) => w.back(),
        };
        if outcome == BackOutcome::Close {
            self.overlay = None;
        }
    }

    #[must_use]
    pub const fn plan_wizard(&mut self) -> Option<&mut PlanWizard> {
        match self.overlay.as_mut() {
            Some(Overlay::ModifyPlan(w)) => Some(w),
            _ => None,
        }
    }

    #[must_use]
    pub const fn date_wizard(&mut self) -> Option<&mut DateWizard> {
        match self.overlay.as_mut() {
            Some(Overlay::ModifyDate(w)) => Some(w),
            _ => None,
        }
    }

    #[must_use]
    pub const fn delivery_wizard(&mut self) -> Option<&mut DeliveryWizard> {
        match self.overlay.as_mut() {
            Some(Overlay::ModifyDelivery(w)) => Some(w),
            _ => None,
        }
    }

    #[must_use]
    pub const fn reactivate_wizard(&mut self) -> Option<&mut ReactivateWizard> {
        match self.overlay.as_mut() {
            Some(Overlay::Reactivate(w)) => Some(w),
            _ => None,
        }
    }
}

/// The debug override if set, else the current subscription's status, else
/// PAUSED.
#[must_use]
pub fn effective_status(
    status_override: Option<SubscriptionStatus>,
    current: Option<&Subscription>,
) -> SubscriptionStatus {
    status_override
        .or_else(|| current.map(|s| s.status))
        .unwrap_or(SubscriptionStatus::Paused)
}

/// Which main screen layout to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainVariant {
    /// ACTIVE or RETRYING.
    Active,
    /// PAUSED: the customer cancelled.
    Cancelled,
    /// PAUSED_INVOLUNTARY: the last charge failed.
    Paused,
    /// No subscription at all.
    Empty,
}

impl MainVariant {
    #[must_use]
    pub const fn from_status(status: SubscriptionStatus, has_subscription: bool) -> Self {
        if !has_subscription {
            return Self::Empty;
        }
        match status {
            SubscriptionStatus::Active | SubscriptionStatus::Retrying => Self::Active,
            SubscriptionStatus::Paused => Self::Cancelled,
            SubscriptionStatus::PausedInvoluntary => Self::Paused,
        }
    }
}

/// Texts of the status card at the top of the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCard {
    pub title: &'static str,
    pub description: &'static str,
    pub description_alt: Option<&'static str>,
    pub css_class: &'static str,
}

impl StatusCard {
    #[must_use]
    pub const fn for_status(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Active | SubscriptionStatus::Retrying => Self {
                title: "TU SUSCRIPCIÓN ESTÁ ACTIVA",
                description: "Podés modificar tu plan, cambiar la fecha de entrega o cancelarla cuando quieras.",
                description_alt: None,
                css_class: "dashboard-card-active",
            },
            SubscriptionStatus::Paused => Self {
                title: "TU SUSCRIPCIÓN ESTÁ CANCELADA",
                description: "Para volver, elegí un nuevo plan o reactivá el último que tenías.",
                description_alt: None,
                css_class: "dashboard-card-cancel",
            },
            SubscriptionStatus::PausedInvoluntary => Self {
                title: "TU SUSCRIPCIÓN ESTÁ PAUSADA",
                description: "No pudimos cobrar tu último ciclo porque tu método de pago venció.",
                description_alt: Some(
                    "Para volver a recibir tu café, actualizá tu método de pago.",
                ),
                css_class: "dashboard-card-paused",
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::subscription::tests::subscription;

    #[test]
    fn test_default_is_main() {
        let nav = Navigator::new();
        assert_eq!(nav.view(), ViewType::Main);
        assert!(nav.overlay().is_none());
        assert!(nav.shows_tabs());
        assert_eq!(nav.title(), "MI CUENTA");
    }

    #[test]
    fn test_tab_bounds() {
        let mut nav = Navigator::new();
        nav.prev_tab();
        assert_eq!(nav.view(), ViewType::Main);

        nav.next_tab();
        assert_eq!(nav.view(), ViewType::Orders);
        nav.next_tab();
        assert_eq!(nav.view(), ViewType::Benefits);
        nav.next_tab();
        assert_eq!(nav.view(), ViewType::Data);
        nav.next_tab();
        assert_eq!(nav.view(), ViewType::PaymentMethod);
        nav.next_tab();
        assert_eq!(nav.view(), ViewType::PaymentMethod);

        nav.prev_tab();
        assert_eq!(nav.view(), ViewType::Data);
    }

    #[test]
    fn test_swipe_ignored_outside_tabs() {
        let mut nav = Navigator::new();
        nav.start_cancel(true);
        nav.next_tab();
        assert_eq!(nav.view(), ViewType::CancelReason);
        assert!(!nav.shows_tabs());
    }

    #[test]
    fn test_close_buttons() {
        assert!(!ViewType::Main.shows_close());
        assert!(ViewType::Orders.shows_close());
        assert!(ViewType::Benefits.shows_close());
        assert!(ViewType::Data.shows_close());
        assert!(ViewType::PaymentMethod.shows_close());
        assert!(!ViewType::CancelReason.shows_close());
    }

    #[test]
    fn test_show_tab_rejects_funnel_views() {
        let mut nav = Navigator::new();
        assert_eq!(nav.show_tab(ViewType::CancelConfirm), Err(FlowError::InvalidAction));
        assert!(nav.show_tab(ViewType::Data).is_ok());
        assert_eq!(nav.view(), ViewType::Data);
    }

    #[test]
    fn test_overlay_priority_and_close() {
        let mut nav = Navigator::new();
        nav.show_tab(ViewType::Benefits).unwrap();
        nav.open_overlay(Overlay::ModifyPlan(PlanWizard::new(false, None)));
        assert!(matches!(nav.overlay(), Some(Overlay::ModifyPlan(_))));
        assert!(!nav.shows_tabs());

        nav.close_overlay();
        assert!(nav.overlay().is_none());
        assert_eq!(nav.view(), ViewType::Benefits);
    }

    #[test]
    fn test_opening_overlay_replaces_other() {
        let mut nav = Navigator::new();
        nav.open_overlay(Overlay::ModifyDate(DateWizard::new()));
        nav.open_overlay(Overlay::ModifyDelivery(DeliveryWizard::new(None)));
        assert!(matches!(nav.overlay(), Some(Overlay::ModifyDelivery(_))));
        assert!(nav.date_wizard().is_none());
    }

    #[test]
    fn test_overlay_back_closes_on_first_step() {
        let mut nav = Navigator::new();
        nav.open_overlay(Overlay::ModifyDate(DateWizard::new()));
        nav.overlay_back();
        assert!(nav.overlay().is_none());
    }

    #[test]
    fn test_titles() {
        assert_eq!(ViewType::Main.title(), "MI CUENTA");
        assert_eq!(ViewType::Orders.title(), "MI CUENTA");
        assert_eq!(ViewType::CancelReason.title(), "Cancelar suscripción");
        assert_eq!(ViewType::CancelSuccess.title(), "Suscripción cancelada");
        assert_eq!(ViewType::BenefitSuccess.title(), "Cancelar suscripción");
    }

    #[test]
    fn test_effective_status() {
        let sub = subscription(SubscriptionStatus::Active);
        assert_eq!(effective_status(None, Some(&sub)), SubscriptionStatus::Active);
        assert_eq!(
            effective_status(Some(SubscriptionStatus::Retrying), Some(&sub)),
            SubscriptionStatus::Retrying
        );
        assert_eq!(effective_status(None, None), SubscriptionStatus::Paused);
    }

    #[test]
    fn test_main_variant_by_status() {
        use SubscriptionStatus::*;
        assert_eq!(MainVariant::from_status(Active, true), MainVariant::Active);
        assert_eq!(MainVariant::from_status(Retrying, true), MainVariant::Active);
        assert_eq!(MainVariant::from_status(Paused, true), MainVariant::Cancelled);
        assert_eq!(
            MainVariant::from_status(PausedInvoluntary, true),
            MainVariant::Paused
        );
        assert_eq!(MainVariant::from_status(Active, false), MainVariant::Empty);
    }

    #[test]
    fn test_status_cards() {
        let paused = StatusCard::for_status(SubscriptionStatus::PausedInvoluntary);
        assert_eq!(paused.title, "TU SUSCRIPCIÓN ESTÁ PAUSADA");
        assert!(paused.description_alt.is_some());
        assert_eq!(
            StatusCard::for_status(SubscriptionStatus::Retrying).title,
            "TU SUSCRIPCIÓN ESTÁ ACTIVA"
        );
        assert_eq!(
            StatusCard::for_status(SubscriptionStatus::Paused).title,
            "TU SUSCRIPCIÓN ESTÁ CANCELADA"
        );
    }

    #[test]
    fn test_view_parse() {
        assert_eq!("PAYMENT_METHOD".parse(), Ok(ViewType::PaymentMethod));
        assert!("payment".parse::<ViewType>().is_err());
    }

    #[test]
    fn test_navigator_survives_serde() {
        let mut nav = Navigator::new();
        nav.open_overlay(Overlay::Reactivate(ReactivateWizard::overlay(None)));
        let json = serde_json::to_string(&nav).unwrap();
        let back: Navigator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, nav);
    }
}
