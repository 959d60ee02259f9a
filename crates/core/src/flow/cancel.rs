//! Cancellation funnel: reason → retention offer → confirm → success.

use serde::{Deserialize, Serialize};

use super::{FlowError, Navigator, ViewType};
use crate::types::CancellationReason;

/// Buttons available inside the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelAction {
    Back,
    Close,
    /// "Volver sin cancelar" / "Mantener mi suscripción".
    Keep,
    Continue,
    /// Accept the retention offer.
    Accept,
    /// "Quiero cancelar igual".
    Decline,
    Confirm,
}

/// API call that must succeed before the funnel moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelCommand {
    /// `POST /coupons/apply` with `flow_type: RETENTION`.
    ApplyRetentionCoupon,
    /// PATCH `status: PAUSED` with the chosen reason.
    Pause { reason: CancellationReason },
}

/// Where an action leads, plus the call to make first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancelStep {
    pub to: ViewType,
    pub command: Option<CancelCommand>,
}

impl CancelStep {
    const fn go(to: ViewType) -> Self {
        Self { to, command: None }
    }
}

impl Navigator {
    /// Enter the funnel at CANCEL_REASON.
    ///
    /// `offer_eligible` is fixed for the whole funnel: no flow coupon applied
    /// and not an Itaú annual subscription.
    pub fn start_cancel(&mut self, offer_eligible: bool) {
        self.overlay = None;
        self.view = ViewType::CancelReason;
        self.cancel_reason = None;
        self.offer_eligible = offer_eligible;
    }

    /// Pick a reason on CANCEL_REASON.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::InvalidAction`] outside CANCEL_REASON.
    pub fn select_reason(&mut self, reason: CancellationReason) -> Result<(), FlowError> {
        if self.view != ViewType::CancelReason {
            return Err(FlowError::InvalidAction);
        }
        self.cancel_reason = Some(reason);
        Ok(())
    }

    /// Resolve an action without moving.
    ///
    /// # Errors
    ///
    /// - [`FlowError::ReasonRequired`] when continuing or confirming without a reason
    /// - [`FlowError::InvalidAction`] for actions the current view does not offer
    pub fn plan_cancel(&self, action: CancelAction) -> Result<CancelStep, FlowError> {
        use CancelAction as A;
        use ViewType as V;

        let step = match (self.view, action) {
            (V::CancelReason, A::Back | A::Close | A::Keep) => CancelStep::go(V::Main),
            (V::CancelReason, A::Continue) => {
                if self.cancel_reason.is_none() {
                    return Err(FlowError::ReasonRequired);
                }
                if self.offer_eligible {
                    CancelStep::go(V::CancelOffer)
                } else {
                    CancelStep::go(V::CancelConfirm)
                }
            }

            (V::CancelOffer, A::Back) => CancelStep::go(V::CancelReason),
            (V::CancelOffer, A::Close | A::Keep) => CancelStep::go(V::Main),
            (V::CancelOffer, A::Accept) => CancelStep {
                to: V::BenefitSuccess,
                command: Some(CancelCommand::ApplyRetentionCoupon),
            },
            (V::CancelOffer, A::Decline) => CancelStep::go(V::CancelConfirm),

            (V::CancelConfirm, A::Back) => {
                if self.offer_eligible {
                    CancelStep::go(V::CancelOffer)
                } else {
                    CancelStep::go(V::CancelReason)
                }
            }
            (V::CancelConfirm, A::Close | A::Keep) => CancelStep::go(V::Main),
            (V::CancelConfirm, A::Confirm) => {
                let reason = self.cancel_reason.ok_or(FlowError::ReasonRequired)?;
                CancelStep {
                    to: V::CancelSuccess,
                    command: Some(CancelCommand::Pause { reason }),
                }
            }

            (V::BenefitSuccess | V::CancelSuccess, A::Back | A::Close | A::Keep) => {
                CancelStep::go(V::Main)
            }

            _ => return Err(FlowError::InvalidAction),
        };

        Ok(step)
    }

    /// Move to the step returned by [`Self::plan_cancel`].
    pub fn commit_cancel(&mut self, step: CancelStep) {
        self.view = step.to;
        if step.to == ViewType::Main {
            self.cancel_reason = None;
        }
    }

    /// Plan and commit in one go, for actions that need no API call.
    ///
    /// # Errors
    ///
    /// Same as [`Self::plan_cancel`]; also [`FlowError::InvalidAction`] when
    /// the action needs a command.
    pub fn cancel_navigate(&mut self, action: CancelAction) -> Result<(), FlowError> {
        let step = self.plan_cancel(action)?;
        if step.command.is_some() {
            return Err(FlowError::InvalidAction);
        }
        self.commit_cancel(step);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn funnel(eligible: bool) -> Navigator {
        let mut nav = Navigator::new();
        nav.start_cancel(eligible);
        nav
    }

    fn at(view: ViewType, eligible: bool) -> Navigator {
        let mut nav = funnel(eligible);
        nav.select_reason(CancellationReason::Economic).unwrap();
        nav.view = view;
        nav
    }

    #[test]
    fn test_reason_exits_to_main() {
        for action in [CancelAction::Back, CancelAction::Close, CancelAction::Keep] {
            let mut nav = funnel(true);
            nav.cancel_navigate(action).unwrap();
            assert_eq!(nav.view(), ViewType::Main);
        }
    }

    #[test]
    fn test_continue_requires_reason() {
        let nav = funnel(true);
        assert_eq!(
            nav.plan_cancel(CancelAction::Continue),
            Err(FlowError::ReasonRequired)
        );
    }

    #[test]
    fn test_continue_goes_to_offer_when_eligible() {
        let mut nav = funnel(true);
        nav.select_reason(CancellationReason::Vacations).unwrap();
        nav.cancel_navigate(CancelAction::Continue).unwrap();
        assert_eq!(nav.view(), ViewType::CancelOffer);
    }

    #[test]
    fn test_continue_skips_offer_when_not_eligible() {
        let mut nav = funnel(false);
        nav.select_reason(CancellationReason::Vacations).unwrap();
        nav.cancel_navigate(CancelAction::Continue).unwrap();
        assert_eq!(nav.view(), ViewType::CancelConfirm);
    }

    #[test]
    fn test_offer_edges() {
        let nav = at(ViewType::CancelOffer, true);
        assert_eq!(
            nav.plan_cancel(CancelAction::Back).unwrap().to,
            ViewType::CancelReason
        );
        assert_eq!(
            nav.plan_cancel(CancelAction::Decline).unwrap().to,
            ViewType::CancelConfirm
        );

        let accept = nav.plan_cancel(CancelAction::Accept).unwrap();
        assert_eq!(accept.to, ViewType::BenefitSuccess);
        assert_eq!(accept.command, Some(CancelCommand::ApplyRetentionCoupon));
    }

    #[test]
    fn test_confirm_back_depends_on_eligibility() {
        let eligible = at(ViewType::CancelConfirm, true);
        assert_eq!(
            eligible.plan_cancel(CancelAction::Back).unwrap().to,
            ViewType::CancelOffer
        );

        let not_eligible = at(ViewType::CancelConfirm, false);
        assert_eq!(
            not_eligible.plan_cancel(CancelAction::Back).unwrap().to,
            ViewType::CancelReason
        );
    }

    #[test]
    fn test_confirm_pauses_with_reason() {
        let nav = at(ViewType::CancelConfirm, true);
        let step = nav.plan_cancel(CancelAction::Confirm).unwrap();
        assert_eq!(step.to, ViewType::CancelSuccess);
        assert_eq!(
            step.command,
            Some(CancelCommand::Pause {
                reason: CancellationReason::Economic
            })
        );

        for action in [CancelAction::Close, CancelAction::Keep] {
            assert_eq!(nav.plan_cancel(action).unwrap().to, ViewType::Main);
        }
    }

    #[test]
    fn test_success_screens_return_to_main() {
        for view in [ViewType::CancelSuccess, ViewType::BenefitSuccess] {
            let mut nav = at(view, true);
            nav.cancel_navigate(CancelAction::Back).unwrap();
            assert_eq!(nav.view(), ViewType::Main);
            assert!(nav.cancel_reason().is_none());
        }
    }

    #[test]
    fn test_failed_call_leaves_funnel_in_place() {
        let nav = at(ViewType::CancelOffer, true);
        // The handler does not commit when the coupon call fails.
        let _ = nav.plan_cancel(CancelAction::Accept).unwrap();
        assert_eq!(nav.view(), ViewType::CancelOffer);
    }

    #[test]
    fn test_navigate_refuses_commands() {
        let mut nav = at(ViewType::CancelConfirm, true);
        assert_eq!(
            nav.cancel_navigate(CancelAction::Confirm),
            Err(FlowError::InvalidAction)
        );
        assert_eq!(nav.view(), ViewType::CancelConfirm);
    }

    #[test]
    fn test_unavailable_actions() {
        let nav = at(ViewType::CancelReason, true);
        assert_eq!(
            nav.plan_cancel(CancelAction::Accept),
            Err(FlowError::InvalidAction)
        );
        let main = Navigator::new();
        assert_eq!(
            main.plan_cancel(CancelAction::Continue),
            Err(FlowError::InvalidAction)
        );
    }

    #[test]
    fn test_select_reason_only_on_reason_view() {
        let mut nav = Navigator::new();
        assert_eq!(
            nav.select_reason(CancellationReason::Travel),
            Err(FlowError::InvalidAction)
        );
    }
}
