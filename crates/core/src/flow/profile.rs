//! "Datos" form: customer profile and phone verification.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use super::FlowError;
use crate::validation::{normalize_phone, validate_code, validate_email, validate_phone, validate_rut};

/// Seconds between verification code resends.
pub const RESEND_COOLDOWN_SECS: i64 = 30;

pub const RESEND_SENT_MESSAGE: &str =
    "Te enviamos un nuevo código por WhatsApp/SMS. Podés volver a reenviarlo en 30 segundos.";
pub const RESEND_READY_MESSAGE: &str = "Si no recibiste el código, podés volver a reenviarlo.";

/// Profile fields as posted by the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileForm {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub apellido: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub rut: String,
    #[serde(default)]
    pub razon_social: String,
}

/// Per-field messages from a failed save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProfileErrors {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub rut: Option<String>,
}

impl ProfileErrors {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.rut.is_none()
    }
}

impl ProfileForm {
    /// Run every validator and report all failures at once.
    ///
    /// # Errors
    ///
    /// Returns the messages for each invalid field.
    pub fn validate(&self) -> Result<(), ProfileErrors> {
        let errors = ProfileErrors {
            email: validate_email(&self.email).err().map(str::to_owned),
            phone: validate_phone(&self.phone).err().map(str::to_owned),
            rut: validate_rut(&self.rut).err().map(str::to_owned),
        };
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Copy with the phone normalized and the other fields trimmed.
    #[must_use]
    pub fn normalized(&self) -> Self {
        Self {
            nombre: self.nombre.trim().to_owned(),
            apellido: self.apellido.trim().to_owned(),
            email: self.email.trim().to_owned(),
            phone: normalize_phone(&self.phone),
            rut: self.rut.trim().to_owned(),
            razon_social: self.razon_social.trim().to_owned(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhoneStatus {
    #[default]
    Unverified,
    CodeCardOpen,
    Verified,
}

/// Phone verification progress for the number in the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PhoneVerification {
    status: PhoneStatus,
    /// Normalized number the customer started with, or last verified.
    original: String,
    last_resend: Option<DateTime<Utc>>,
}

impl PhoneVerification {
    #[must_use]
    pub fn new(original_phone: &str) -> Self {
        Self {
            status: PhoneStatus::Unverified,
            original: normalize_phone(original_phone),
            last_resend: None,
        }
    }

    #[must_use]
    pub const fn status(&self) -> PhoneStatus {
        self.status
    }

    /// The verified number, when verified.
    #[must_use]
    pub fn verified_number(&self) -> Option<&str> {
        (self.status == PhoneStatus::Verified).then_some(self.original.as_str())
    }

    fn differs_from_original(&self, phone: &str) -> bool {
        normalize_phone(phone) != self.original
    }

    /// Call whenever the form's phone changes. A verified number that was
    /// edited goes back to unverified.
    pub fn phone_changed(&mut self, phone: &str) {
        if self.status == PhoneStatus::Verified && self.differs_from_original(phone) {
            self.status = PhoneStatus::Unverified;
        }
    }

    /// "Validar teléfono".
    ///
    /// # Errors
    ///
    /// The phone validator's message when the number is not valid.
    pub fn open_code_card(&mut self, phone: &str) -> Result<(), FlowError> {
        validate_phone(phone).map_err(FlowError::InvalidField)?;
        if normalize_phone(phone).is_empty() {
            return Err(FlowError::InvalidField(
                crate::validation::PHONE_COUNTRY_CODE_MESSAGE,
            ));
        }
        self.status = PhoneStatus::CodeCardOpen;
        Ok(())
    }

    /// "Confirmar código". The code format is the only check.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidField`] unless the code has 6 digits.
    pub fn confirm_code(&mut self, code: &str, phone: &str) -> Result<(), FlowError> {
        if self.status != PhoneStatus::CodeCardOpen {
            return Err(FlowError::InvalidAction);
        }
        validate_code(code).map_err(FlowError::InvalidField)?;
        self.status = PhoneStatus::Verified;
        self.original = normalize_phone(phone);
        self.last_resend = None;
        Ok(())
    }

    /// Seconds left before another resend is allowed.
    #[must_use]
    pub fn cooldown_remaining(&self, now: DateTime<Utc>) -> i64 {
        self.last_resend.map_or(0, |at| {
            let elapsed = now.signed_duration_since(at);
            (TimeDelta::seconds(RESEND_COOLDOWN_SECS) - elapsed)
                .num_seconds()
                .max(0)
        })
    }

    /// "Reenviar código".
    ///
    /// # Errors
    ///
    /// [`FlowError::ResendCooldown`] while the cooldown runs.
    pub fn resend(&mut self, now: DateTime<Utc>) -> Result<(), FlowError> {
        if self.status != PhoneStatus::CodeCardOpen {
            return Err(FlowError::InvalidAction);
        }
        let seconds = self.cooldown_remaining(now);
        if seconds > 0 {
            return Err(FlowError::ResendCooldown { seconds });
        }
        self.last_resend = Some(now);
        Ok(())
    }

    /// Feedback under the code input, if a resend happened.
    #[must_use]
    pub fn resend_feedback(&self, now: DateTime<Utc>) -> Option<&'static str> {
        self.last_resend?;
        if self.cooldown_remaining(now) > 0 {
            Some(RESEND_SENT_MESSAGE)
        } else {
            Some(RESEND_READY_MESSAGE)
        }
    }

    /// Help text under the phone field.
    #[must_use]
    pub fn help_text(&self, phone: &str) -> &'static str {
        if self.status == PhoneStatus::Verified {
            "Si cambiás tu número, vas a tener que validarlo de nuevo para que Charli pueda seguir reconociendo tu suscripción."
        } else if !self.original.is_empty() && self.differs_from_original(phone) {
            "Cambiaste el número. Vas a tener que validarlo nuevamente para que Charli pueda reconocerte."
        } else {
            "Validar tu número es clave para que Charli pueda reconocerte y gestionar tu suscripción por WhatsApp."
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-18T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn open(phone: &str) -> PhoneVerification {
        let mut v = PhoneVerification::new(phone);
        v.open_code_card(phone).unwrap();
        v
    }

    #[test]
    fn test_validate_reports_every_field() {
        let form = ProfileForm {
            email: "nope".to_owned(),
            phone: "099 123 456".to_owned(),
            rut: "123".to_owned(),
            ..ProfileForm::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.email.as_deref(), Some("Ingresá un email válido."));
        assert_eq!(
            errors.phone.as_deref(),
            Some("Ingresá el número con código de país. Ej: +598 99 123 456")
        );
        assert_eq!(errors.rut.as_deref(), Some("Ingresá un RUT de 12 dígitos."));
    }

    #[test]
    fn test_validate_accepts_optional_fields_empty() {
        let form = ProfileForm {
            nombre: "Ana".to_owned(),
            email: "ana@culto.coffee".to_owned(),
            ..ProfileForm::default()
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_normalized() {
        let form = ProfileForm {
            nombre: " Ana ".to_owned(),
            phone: "+598 99 345 368".to_owned(),
            ..ProfileForm::default()
        };
        let normalized = form.normalized();
        assert_eq!(normalized.nombre, "Ana");
        assert_eq!(normalized.phone, "+59899345368");
    }

    #[test]
    fn test_confirm_requires_six_digits() {
        let mut v = open("+59899345368");
        assert_eq!(
            v.confirm_code("123", "+59899345368"),
            Err(FlowError::InvalidField("Ingresá el código completo de 6 dígitos."))
        );
        assert_eq!(v.status(), PhoneStatus::CodeCardOpen);

        v.confirm_code("123456", "+598 99 345 368").unwrap();
        assert_eq!(v.status(), PhoneStatus::Verified);
        assert_eq!(v.verified_number(), Some("+59899345368"));
    }

    #[test]
    fn test_open_requires_valid_phone() {
        let mut v = PhoneVerification::new("");
        assert!(v.open_code_card("").is_err());
        assert!(v.open_code_card("099123456").is_err());
        assert_eq!(v.status(), PhoneStatus::Unverified);
    }

    #[test]
    fn test_saving_keeps_code_card_open() {
        let mut v = PhoneVerification::new("+59899000000");
        v.open_code_card("+59899111111").unwrap();

        v.phone_changed("+59899111111");
        assert_eq!(v.status(), PhoneStatus::CodeCardOpen);
    }

    #[test]
    fn test_changing_number_resets_verification() {
        let mut v = open("+59899345368");
        v.confirm_code("123456", "+59899345368").unwrap();

        v.phone_changed("+598 99 345 368");
        assert_eq!(v.status(), PhoneStatus::Verified);

        v.phone_changed("+59899000000");
        assert_eq!(v.status(), PhoneStatus::Unverified);
        assert_eq!(v.verified_number(), None);
    }

    #[test]
    fn test_resend_cooldown() {
        let mut v = open("+59899345368");
        assert_eq!(v.resend_feedback(now()), None);

        v.resend(now()).unwrap();
        assert_eq!(v.resend_feedback(now()), Some(RESEND_SENT_MESSAGE));
        assert_eq!(v.cooldown_remaining(now() + TimeDelta::seconds(10)), 20);
        assert_eq!(
            v.resend(now() + TimeDelta::seconds(10)),
            Err(FlowError::ResendCooldown { seconds: 20 })
        );

        let later = now() + TimeDelta::seconds(30);
        assert_eq!(v.resend_feedback(later), Some(RESEND_READY_MESSAGE));
        assert!(v.resend(later).is_ok());
    }

    #[test]
    fn test_help_texts() {
        let mut v = PhoneVerification::new("+59899345368");
        assert!(v.help_text("+59899345368").starts_with("Validar tu número es clave"));
        assert!(v.help_text("+59899000000").starts_with("Cambiaste el número"));

        v.open_code_card("+59899345368").unwrap();
        v.confirm_code("654321", "+59899345368").unwrap();
        assert!(v.help_text("+59899345368").starts_with("Si cambiás tu número"));
    }
}
