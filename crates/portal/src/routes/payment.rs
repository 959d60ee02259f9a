//! "Método de pago" tab.

use axum::{Form, response::Redirect};
use tracing::instrument;

use culto_portal_core::flow::{PaymentMethodState, payment};
use culto_portal_core::validation::{CardForm, CardSummary};

use super::{back_home, report};
use crate::error::Result;
use crate::middleware::Portal;

#[derive(Debug, Clone)]
pub struct PaymentView {
    /// `"Visa •••• 1234"`
    pub card: String,
    pub form_open: bool,
    pub saved: bool,
}

impl PaymentView {
    #[must_use]
    pub fn new(state: PaymentMethodState, known: Option<&CardSummary>) -> Self {
        Self {
            card: payment::current_card(known).display(),
            form_open: state.form_open,
            saved: state.saved,
        }
    }
}

/// "Actualizar".
#[instrument(skip(portal))]
pub async fn open(mut portal: Portal) -> Result<Redirect> {
    portal.customer()?;
    portal.state.payment.open_form();
    back_home(&portal).await
}

/// "Guardar método de pago". The card never leaves the session; only brand
/// and last four digits are kept.
#[instrument(skip(portal, card))]
pub async fn save(mut portal: Portal, Form(card): Form<CardForm>) -> Result<Redirect> {
    let customer_id = portal.customer()?.id.clone();
    match portal.state.payment.save(&card) {
        Ok(summary) => {
            tracing::info!(customer_id = %customer_id, brand = %summary.brand, "Payment method updated");
            portal.state.card = Some(summary);
            portal.state.flash_success(payment::SAVED_MESSAGE);
        }
        Err(e) => report(&mut portal.state, Err(e.into())),
    }
    back_home(&portal).await
}
