//! "Método de pago" tab.

use serde::{Deserialize, Serialize};

use super::FlowError;
use crate::validation::{CardForm, CardSummary};

pub const SAVED_MESSAGE: &str = "Método de pago actualizado";

/// Whether the update form is open and whether the last save succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaymentMethodState {
    pub form_open: bool,
    pub saved: bool,
}

impl PaymentMethodState {
    /// "Actualizar".
    pub fn open_form(&mut self) {
        self.form_open = true;
        self.saved = false;
    }

    /// Validate the posted card and close the form.
    ///
    /// # Errors
    ///
    /// [`FlowError::CardIncomplete`] when a field is missing or too short.
    pub fn save(&mut self, card: &CardForm) -> Result<CardSummary, FlowError> {
        let summary = card.summary().ok_or(FlowError::CardIncomplete)?;
        self.form_open = false;
        self.saved = true;
        Ok(summary)
    }
}

/// The card to show: the session's, else the placeholder.
#[must_use]
pub fn current_card(known: Option<&CardSummary>) -> CardSummary {
    known.cloned().unwrap_or_else(CardSummary::placeholder)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_until_known() {
        assert_eq!(current_card(None).display(), "Visa •••• 1234");
        let amex = CardSummary {
            brand: "American Express".to_owned(),
            last4: "0005".to_owned(),
        };
        assert_eq!(current_card(Some(&amex)).display(), "American Express •••• 0005");
    }

    #[test]
    fn test_save_flow() {
        let mut state = PaymentMethodState::default();
        state.open_form();
        assert!(state.form_open);

        assert_eq!(state.save(&CardForm::default()), Err(FlowError::CardIncomplete));
        assert!(state.form_open);
        assert!(!state.saved);

        let card = CardForm {
            card_holder: "Ana".to_owned(),
            card_number: "378282246310005".to_owned(),
            card_expiry: "0830".to_owned(),
            card_cvv: "1234".to_owned(),
        };
        let summary = state.save(&card).unwrap();
        assert_eq!(summary.brand, "American Express");
        assert!(state.saved);
        assert!(!state.form_open);
    }
}
