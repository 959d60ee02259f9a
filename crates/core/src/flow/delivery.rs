//! Delivery selection and the modify-delivery wizard.

use serde::{Deserialize, Serialize};

use super::{BackOutcome, FlowError};
use crate::catalog::{self, DeliveryOption, Store};
use crate::types::{Address, DeliveryMethod, Subscription, SubscriptionUpdate};

const COUNTRY: &str = "UY";

/// Address fields as shown in the delivery forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressForm {
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

impl Default for AddressForm {
    fn default() -> Self {
        Self {
            departamento: catalog::DEPARTAMENTOS[0].to_owned(),
            direccion: String::new(),
            apartamento: String::new(),
            barrio: catalog::BARRIOS[0].to_owned(),
            codigo_postal: catalog::CODIGOS_POSTALES[0].to_owned(),
        }
    }
}

impl AddressForm {
    /// Seed the form from an API address.
    #[must_use]
    pub fn from_address(address: &Address) -> Self {
        Self {
            departamento: address.province.clone(),
            direccion: address.address1.clone(),
            apartamento: address.address2.clone().unwrap_or_default(),
            barrio: address.city.clone(),
            codigo_postal: address.zip.clone(),
        }
    }

    /// Departamento, dirección, barrio and código postal are required.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            &self.departamento,
            &self.direccion,
            &self.barrio,
            &self.codigo_postal,
        ]
        .iter()
        .all(|field| !field.trim().is_empty())
    }

    /// `"Rivera 1234, Pocitos, Montevideo"`
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}, {}, {}",
            self.direccion.trim(),
            self.barrio.trim(),
            self.departamento.trim()
        )
    }

    #[must_use]
    pub fn to_address(&self) -> Address {
        let apartamento = self.apartamento.trim();
        Address {
            address1: self.direccion.trim().to_owned(),
            address2: (!apartamento.is_empty()).then(|| apartamento.to_owned()),
            city: self.barrio.trim().to_owned(),
            province: self.departamento.trim().to_owned(),
            zip: self.codigo_postal.trim().to_owned(),
            country: COUNTRY.to_owned(),
        }
    }
}

/// Shipping or pickup, with the data each needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliverySelection {
    pub option: DeliveryOption,
    pub store_id: String,
    pub address: AddressForm,
}

impl Default for DeliverySelection {
    fn default() -> Self {
        Self {
            option: DeliveryOption::Envio,
            store_id: catalog::DEFAULT_STORE.id.to_owned(),
            address: AddressForm::default(),
        }
    }
}

impl DeliverySelection {
    /// Seed from the subscription's current address or pickup store.
    #[must_use]
    pub fn from_subscription(current: Option<&Subscription>) -> Self {
        let mut selection = Self::default();
        let Some(sub) = current else {
            return selection;
        };

        if let Some(address) = &sub.address {
            selection.address = AddressForm::from_address(address);
        }
        if let Some(store) = sub.pickup_location.as_deref().and_then(catalog::store) {
            store.id.clone_into(&mut selection.store_id);
        }
        if sub.delivery_method == DeliveryMethod::Pickup {
            selection.option = DeliveryOption::Retiro;
        }
        selection
    }

    #[must_use]
    pub fn store(&self) -> Option<Store> {
        catalog::store(&self.store_id)
    }

    /// (forma, detalle) for the summary card.
    #[must_use]
    pub fn summary(&self) -> (&'static str, String) {
        match self.option {
            DeliveryOption::Envio => (DeliveryMethod::Shipping.label(), self.address.summary()),
            DeliveryOption::Retiro => (
                DeliveryMethod::Pickup.label(),
                self.store().map(|s| s.summary()).unwrap_or_default(),
            ),
        }
    }

    #[must_use]
    pub const fn footnote(&self) -> &'static str {
        match self.option {
            DeliveryOption::Envio => {
                "Este cambio impacta en tu próxima entrega programada a domicilio."
            }
            DeliveryOption::Retiro => {
                "Este cambio impacta en tu próxima entrega para retiro en el local seleccionado."
            }
        }
    }

    /// Replace the selection with posted form values.
    pub fn update(&mut self, option: DeliveryOption, store_id: Option<&str>, address: Option<AddressForm>) {
        self.option = option;
        if let Some(id) = store_id {
            id.clone_into(&mut self.store_id);
        }
        if let Some(address) = address {
            self.address = address;
        }
    }

    /// The delivery fields of a PATCH: the unused one is sent as `null`.
    ///
    /// # Errors
    ///
    /// [`FlowError::AddressIncomplete`] for shipping with missing fields;
    /// [`FlowError::StoreRequired`] for pickup without a known store.
    pub fn to_update(&self) -> Result<SubscriptionUpdate, FlowError> {
        match self.option {
            DeliveryOption::Envio => {
                if !self.address.is_complete() {
                    return Err(FlowError::AddressIncomplete);
                }
                Ok(SubscriptionUpdate {
                    delivery_method: Some(DeliveryMethod::Shipping),
                    address: Some(Some(self.address.to_address())),
                    pickup_location: Some(None),
                    ..SubscriptionUpdate::default()
                })
            }
            DeliveryOption::Retiro => {
                let store = self.store().ok_or(FlowError::StoreRequired)?;
                Ok(SubscriptionUpdate {
                    delivery_method: Some(DeliveryMethod::Pickup),
                    pickup_location: Some(Some(store.name.to_owned())),
                    address: Some(None),
                    ..SubscriptionUpdate::default()
                })
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStep {
    #[default]
    Edit,
    Confirm,
}

/// State of the modify-delivery overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWizard {
    step: DeliveryStep,
    selection: DeliverySelection,
}

impl DeliveryWizard {
    #[must_use]
    pub fn new(current: Option<&Subscription>) -> Self {
        Self {
            step: DeliveryStep::Edit,
            selection: DeliverySelection::from_subscription(current),
        }
    }

    #[must_use]
    pub const fn step(&self) -> DeliveryStep {
        self.step
    }

    #[must_use]
    pub const fn selection(&self) -> &DeliverySelection {
        &self.selection
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        "MODIFICAR ENTREGA"
    }

    /// Switch between envío and retiro without submitting.
    pub fn select_option(&mut self, option: DeliveryOption) {
        if self.step == DeliveryStep::Edit {
            self.selection.option = option;
        }
    }

    /// Store the posted form and build the PATCH.
    ///
    /// The form is kept even when it is incomplete so the customer does not
    /// lose what they typed.
    ///
    /// # Errors
    ///
    /// See [`DeliverySelection::to_update`].
    pub fn confirm_request(
        &mut self,
        option: DeliveryOption,
        store_id: Option<&str>,
        address: Option<AddressForm>,
    ) -> Result<SubscriptionUpdate, FlowError> {
        if self.step != DeliveryStep::Edit {
            return Err(FlowError::InvalidAction);
        }
        self.selection.update(option, store_id, address);
        self.selection.to_update()
    }

    pub fn mark_confirmed(&mut self) {
        self.step = DeliveryStep::Confirm;
    }

    pub(super) fn back(&mut self) -> BackOutcome {
        match self.step {
            DeliveryStep::Edit => BackOutcome::Close,
            DeliveryStep::Confirm => {
                self.step = DeliveryStep::Edit;
                BackOutcome::Moved
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::SubscriptionStatus;
    use crate::types::subscription::tests::subscription;

    fn address_form() -> AddressForm {
        AddressForm {
            departamento: "Montevideo".to_owned(),
            direccion: "Rivera 1234".to_owned(),
            apartamento: "Apto 101".to_owned(),
            barrio: "Pocitos".to_owned(),
            codigo_postal: "11300".to_owned(),
        }
    }

    #[test]
    fn test_seeds_pickup_store_from_subscription() {
        let mut sub = subscription(SubscriptionStatus::Active);
        sub.delivery_method = DeliveryMethod::Pickup;
        sub.pickup_location = Some("Tostaduría".to_owned());

        let wizard = DeliveryWizard::new(Some(&sub));
        assert_eq!(wizard.selection().option, DeliveryOption::Retiro);
        assert_eq!(wizard.selection().store_id, "tostaduria");
    }

    #[test]
    fn test_seeds_address_from_subscription() {
        let mut sub = subscription(SubscriptionStatus::Active);
        sub.address = Some(address_form().to_address());

        let wizard = DeliveryWizard::new(Some(&sub));
        assert_eq!(wizard.selection().option, DeliveryOption::Envio);
        assert_eq!(wizard.selection().address, address_form());
    }

    #[test]
    fn test_summaries_and_footnotes() {
        let mut selection = DeliverySelection {
            address: address_form(),
            ..DeliverySelection::default()
        };
        assert_eq!(
            selection.summary(),
            ("Envío a domicilio", "Rivera 1234, Pocitos, Montevideo".to_owned())
        );
        assert!(selection.footnote().contains("a domicilio"));

        selection.option = DeliveryOption::Retiro;
        selection.store_id = "epa".to_owned();
        assert_eq!(
            selection.summary(),
            ("Retiro en local", "Epa - Constituyente 2045".to_owned())
        );
        assert!(selection.footnote().contains("local seleccionado"));
    }

    #[test]
    fn test_shipping_requires_fields() {
        let mut wizard = DeliveryWizard::new(None);
        let mut incomplete = address_form();
        incomplete.barrio = " ".to_owned();
        assert_eq!(
            wizard.confirm_request(DeliveryOption::Envio, None, Some(incomplete)),
            Err(FlowError::AddressIncomplete)
        );

        let mut no_apartment = address_form();
        no_apartment.apartamento.clear();
        let update = wizard
            .confirm_request(DeliveryOption::Envio, None, Some(no_apartment))
            .unwrap();
        let address = update.address.clone().unwrap().unwrap();
        assert_eq!(address.address2, None);
        assert_eq!(update.pickup_location, Some(None));
        assert_eq!(update.delivery_method, Some(DeliveryMethod::Shipping));
    }

    #[test]
    fn test_pickup_sends_store_name_and_null_address() {
        let mut wizard = DeliveryWizard::new(None);
        let update = wizard
            .confirm_request(DeliveryOption::Retiro, Some("punta-carretas"), None)
            .unwrap();
        assert_eq!(update.pickup_location, Some(Some("Punta Carretas".to_owned())));
        assert_eq!(update.address, Some(None));
        assert_eq!(update.delivery_method, Some(DeliveryMethod::Pickup));
    }

    #[test]
    fn test_pickup_requires_known_store() {
        let mut wizard = DeliveryWizard::new(None);
        assert_eq!(
            wizard.confirm_request(DeliveryOption::Retiro, Some("cordon"), None),
            Err(FlowError::StoreRequired)
        );
    }

    #[test]
    fn test_back_rules() {
        let mut wizard = DeliveryWizard::new(None);
        wizard.mark_confirmed();
        assert_eq!(wizard.back(), BackOutcome::Moved);
        assert_eq!(wizard.step(), DeliveryStep::Edit);
        assert_eq!(wizard.back(), BackOutcome::Close);
    }
}
