//! "Datos" tab: profile form and phone verification.

use axum::{Form, extract::State, response::Redirect};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use culto_portal_core::flow::{PhoneStatus, ProfileErrors, ProfileForm};

use super::{ActionError, admin_token, back_home, report, upstream};
use crate::error::{Result, add_breadcrumb};
use crate::middleware::Portal;
use crate::models::{CustomerIdentity, ProfileState};
use crate::shopify::{AdminAccess, Customer, CustomerUpdate};
use crate::state::AppState;

pub const SAVED_MESSAGE: &str = "Listo. Guardamos tus cambios.";

const SAVE_FAILED: &str = "No pudimos guardar tus datos. Probá de nuevo.";
const VERIFIED_MESSAGE: &str =
    "Listo, tu teléfono quedó validado. Charli ya te reconoce con este número.";

/// Display data for the "Datos" tab.
#[derive(Debug, Clone)]
pub struct DataView {
    pub form: ProfileForm,
    pub errors: ProfileErrors,
    /// `unverified`, `code-card` or `verified`
    pub phone_status: &'static str,
    pub help_text: &'static str,
    pub verified_message: &'static str,
    pub resend_feedback: Option<&'static str>,
    pub saved_message: Option<&'static str>,
}

impl DataView {
    #[must_use]
    pub fn new(profile: &ProfileState, now: chrono::DateTime<Utc>) -> Self {
        Self {
            form: profile.draft.clone(),
            errors: profile.errors.clone(),
            phone_status: match profile.phone.status() {
                PhoneStatus::Unverified => "unverified",
                PhoneStatus::CodeCardOpen => "code-card",
                PhoneStatus::Verified => "verified",
            },
            help_text: profile.phone.help_text(&profile.draft.phone),
            verified_message: VERIFIED_MESSAGE,
            resend_feedback: profile.phone.resend_feedback(now),
            saved_message: profile.saved.then_some(SAVED_MESSAGE),
        }
    }
}

/// The form as Shopify knows it.
#[must_use]
pub fn form_from_customer(customer: &Customer) -> ProfileForm {
    ProfileForm {
        nombre: customer.first_name.clone(),
        apellido: customer.last_name.clone(),
        email: customer.email.clone().unwrap_or_default(),
        phone: customer.phone.clone().unwrap_or_default(),
        rut: customer.rut.clone().unwrap_or_default(),
        razon_social: customer.razon_social.clone().unwrap_or_default(),
    }
}

/// Load the Shopify customer into the "Datos" state the first time the tab
/// is shown. Falls back to the session's identity when the lookup fails.
pub(crate) async fn seed_profile(state: &AppState, portal: &mut Portal) {
    if portal.state.profile.is_some() {
        return;
    }
    let Some(identity) = portal.state.customer.clone() else {
        return;
    };

    let form = match admin_token(state, portal, &identity.shop).await {
        Some(token) => {
            let access = AdminAccess {
                shop: &identity.shop,
                token: &token,
            };
            match state.admin().customer(&access, &identity.id).await {
                Ok(customer) => form_from_customer(&customer),
                Err(e) => {
                    tracing::warn!(error = %e, customer_id = %identity.id, "Failed to load customer profile");
                    fallback_form(&identity)
                }
            }
        }
        None => {
            tracing::warn!(shop = %identity.shop, "No Admin API token, profile not loaded");
            fallback_form(&identity)
        }
    };
    portal.state.profile = Some(ProfileState::from_form(form));
}

fn fallback_form(identity: &CustomerIdentity) -> ProfileForm {
    ProfileForm {
        nombre: identity.first_name.clone(),
        email: identity.email.clone().unwrap_or_default(),
        ..ProfileForm::default()
    }
}

/// "Guardar cambios".
#[instrument(skip(state, portal, form))]
pub async fn save(
    State(state): State<AppState>,
    mut portal: Portal,
    Form(form): Form<ProfileForm>,
) -> Result<Redirect> {
    let customer = portal.customer()?.clone();

    let profile = portal.state.profile.get_or_insert_with(ProfileState::default);
    profile.phone.phone_changed(&form.phone);
    profile.draft = form.clone();
    profile.saved = false;
    if let Err(errors) = form.validate() {
        profile.errors = errors;
        return back_home(&portal).await;
    }
    profile.errors = ProfileErrors::default();

    let normalized = form.normalized();
    let result = update_customer(&state, &portal, &customer, &normalized).await;
    if result.is_ok() {
        if let Some(profile) = portal.state.profile.as_mut() {
            profile.draft = normalized.clone();
            profile.saved = true;
        }
        if let Some(identity) = portal.state.customer.as_mut() {
            identity.email = Some(normalized.email).filter(|e| !e.is_empty());
            identity.first_name = normalized.nombre;
        }
    }
    report(&mut portal.state, result);
    back_home(&portal).await
}

async fn update_customer(
    state: &AppState,
    portal: &Portal,
    customer: &CustomerIdentity,
    form: &ProfileForm,
) -> std::result::Result<(), ActionError> {
    let token = admin_token(state, portal, &customer.shop)
        .await
        .ok_or_else(|| {
            tracing::warn!(shop = %customer.shop, "No Admin API token, profile not saved");
            ActionError::Upstream(SAVE_FAILED)
        })?;
    let access = AdminAccess {
        shop: &customer.shop,
        token: &token,
    };
    let update = CustomerUpdate {
        first_name: form.nombre.clone(),
        last_name: form.apellido.clone(),
        email: form.email.clone(),
        phone: form.phone.clone(),
        rut: form.rut.clone(),
        razon_social: form.razon_social.clone(),
    };
    state
        .admin()
        .update_customer(&access, &customer.id, &update)
        .await
        .map_err(upstream(SAVE_FAILED))?;

    add_breadcrumb("profile", "Profile saved", None);
    tracing::info!(customer_id = %customer.id, "Profile saved");
    Ok(())
}

/// Phone number currently typed in the form.
#[derive(Debug, Deserialize)]
pub struct PhoneForm {
    #[serde(default)]
    pub phone: String,
}

/// Verification code input.
#[derive(Debug, Deserialize)]
pub struct CodeForm {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub code: String,
}

/// "Validar teléfono": open the code card.
#[instrument(skip(portal, form))]
pub async fn validate_phone(mut portal: Portal, Form(form): Form<PhoneForm>) -> Result<Redirect> {
    portal.customer()?;
    let profile = portal.state.profile.get_or_insert_with(ProfileState::default);
    form.phone.clone_into(&mut profile.draft.phone);
    let result = profile.phone.open_code_card(&form.phone);
    report(&mut portal.state, result.map_err(Into::into));
    back_home(&portal).await
}

/// "Confirmar código".
#[instrument(skip(portal, form))]
pub async fn confirm_code(mut portal: Portal, Form(form): Form<CodeForm>) -> Result<Redirect> {
    let customer_id = portal.customer()?.id.clone();
    let profile = portal.state.profile.get_or_insert_with(ProfileState::default);
    let phone = if form.phone.is_empty() {
        profile.draft.phone.clone()
    } else {
        form.phone
    };
    let result = profile.phone.confirm_code(&form.code, &phone);
    if result.is_ok() {
        tracing::info!(customer_id = %customer_id, "Phone verified");
    }
    report(&mut portal.state, result.map_err(Into::into));
    back_home(&portal).await
}

/// "Reenviar código".
#[instrument(skip(portal))]
pub async fn resend_code(mut portal: Portal) -> Result<Redirect> {
    portal.customer()?;
    let result = portal
        .state
        .profile
        .get_or_insert_with(ProfileState::default)
        .phone
        .resend(Utc::now());
    report(&mut portal.state, result.map_err(Into::into));
    back_home(&portal).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer() -> Customer {
        Customer {
            id: "7001".to_string(),
            first_name: "Ana".to_string(),
            last_name: "Pérez".to_string(),
            email: Some("ana@culto.coffee".to_string()),
            phone: Some("+59899123456".to_string()),
            rut: None,
            razon_social: None,
        }
    }

    #[test]
    fn test_form_from_customer() {
        let form = form_from_customer(&customer());
        assert_eq!(form.nombre, "Ana");
        assert_eq!(form.apellido, "Pérez");
        assert_eq!(form.phone, "+59899123456");
        assert!(form.rut.is_empty());
    }

    #[test]
    fn test_view_of_fresh_profile() {
        let profile = ProfileState::from_form(form_from_customer(&customer()));
        let view = DataView::new(&profile, Utc::now());
        assert_eq!(view.phone_status, "unverified");
        assert!(view.saved_message.is_none());
        assert!(view.resend_feedback.is_none());
        assert!(view.help_text.starts_with("Validar tu número"));
    }

    #[test]
    fn test_view_after_save_and_verification() {
        let mut profile = ProfileState::from_form(form_from_customer(&customer()));
        profile.phone.open_code_card("+59899123456").unwrap();
        profile.phone.confirm_code("123456", "+59899123456").unwrap();
        profile.saved = true;

        let view = DataView::new(&profile, Utc::now());
        assert_eq!(view.phone_status, "verified");
        assert_eq!(view.saved_message, Some(SAVED_MESSAGE));
        assert!(view.help_text.starts_with("Si cambiás tu número"));
    }

    #[test]
    fn test_fallback_form_uses_identity() {
        let identity = CustomerIdentity {
            id: "7001".to_string(),
            shop: "culto.myshopify.com".to_string(),
            path_prefix: String::new(),
            email: Some("ana@culto.coffee".to_string()),
            first_name: "Ana".to_string(),
        };
        let form = fallback_form(&identity);
        assert_eq!(form.nombre, "Ana");
        assert_eq!(form.email, "ana@culto.coffee");
        assert!(form.phone.is_empty());
    }
}
