//! Validators for the customer data the portal collects.
//!
//! Each validator returns `Ok(())` or the Spanish message shown next to the
//! field.

use serde::{Deserialize, Serialize};

use crate::types::Email;

pub const PHONE_COUNTRY_CODE_MESSAGE: &str =
    "Ingresá el número con código de país. Ej: +598 99 123 456";
pub const PHONE_LENGTH_MESSAGE: &str = "Ingresá un número válido (mínimo 8 dígitos).";
pub const RUT_MESSAGE: &str = "Ingresá un RUT de 12 dígitos.";
pub const CODE_MESSAGE: &str = "Ingresá el código completo de 6 dígitos.";

/// A validation failure: the message to show under the field.
pub type FieldError = &'static str;

fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Trim the input and keep a leading `+` plus every digit.
///
/// ```
/// use culto_portal_core::validation::normalize_phone;
///
/// assert_eq!(normalize_phone(" +598 99 123-456 "), "+59899123456");
/// assert_eq!(normalize_phone("099 123 456"), "099123456");
/// ```
#[must_use]
pub fn normalize_phone(raw: &str) -> String {
    let trimmed = raw.trim();
    let digits = digits(trimmed);
    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else {
        digits
    }
}

/// # Errors
///
/// Returns the field message when the trimmed value is not an email.
pub fn validate_email(raw: &str) -> Result<(), FieldError> {
    Email::parse(raw).map(|_| ()).map_err(|e| e.user_message())
}

/// Empty phones are allowed; anything else needs a country code and 8 digits.
///
/// # Errors
///
/// Returns the field message for a missing `+` or a short number.
pub fn validate_phone(raw: &str) -> Result<(), FieldError> {
    let normalized = normalize_phone(raw);
    if normalized.is_empty() {
        return Ok(());
    }
    if !normalized.starts_with('+') {
        return Err(PHONE_COUNTRY_CODE_MESSAGE);
    }
    if digits(&normalized).len() < 8 {
        return Err(PHONE_LENGTH_MESSAGE);
    }
    Ok(())
}

/// RUT is optional, but when present it must have exactly 12 digits.
///
/// # Errors
///
/// Returns the field message for any other digit count.
pub fn validate_rut(raw: &str) -> Result<(), FieldError> {
    match digits(raw).len() {
        0 | 12 => Ok(()),
        _ => Err(RUT_MESSAGE),
    }
}

/// # Errors
///
/// Returns the field message unless the input has exactly 6 digits.
pub fn validate_code(raw: &str) -> Result<(), FieldError> {
    if digits(raw).len() == 6 {
        Ok(())
    } else {
        Err(CODE_MESSAGE)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Card form
// ─────────────────────────────────────────────────────────────────────────────

/// Card fields as posted by the payment forms. Never persisted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CardForm {
    #[serde(default)]
    pub card_holder: String,
    #[serde(default)]
    pub card_number: String,
    #[serde(default)]
    pub card_expiry: String,
    #[serde(default)]
    pub card_cvv: String,
}

/// What the portal remembers about a card: brand and last four digits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardSummary {
    pub brand: String,
    pub last4: String,
}

impl CardSummary {
    /// Shown until the customer enters a card in this session.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            brand: "Visa".to_owned(),
            last4: "1234".to_owned(),
        }
    }

    /// `"Visa •••• 4242"`
    #[must_use]
    pub fn display(&self) -> String {
        format!("{} •••• {}", self.brand, self.last4)
    }
}

impl CardForm {
    /// All four fields are long enough to submit.
    #[must_use]
    pub fn is_filled(&self) -> bool {
        !self.card_holder.trim().is_empty()
            && self.card_number.trim().chars().count() >= 8
            && self.card_expiry.trim().chars().count() >= 4
            && self.card_cvv.trim().chars().count() >= 3
    }

    /// Brand and last four digits, or `None` when the form is incomplete.
    #[must_use]
    pub fn summary(&self) -> Option<CardSummary> {
        if !self.is_filled() {
            return None;
        }
        let number = digits(&self.card_number);
        let last4: String = number
            .chars()
            .rev()
            .take(4)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        Some(CardSummary {
            brand: card_brand(&number).to_owned(),
            last4,
        })
    }
}

/// Guess the card brand from the leading digits.
#[must_use]
pub fn card_brand(number: &str) -> &'static str {
    let number = number.trim();
    let two: u8 = number.get(..2).and_then(|p| p.parse().ok()).unwrap_or(0);
    if number.starts_with('4') {
        "Visa"
    } else if (51..=55).contains(&two) || number.starts_with('2') {
        "Mastercard"
    } else if two == 34 || two == 37 {
        "American Express"
    } else {
        "Tarjeta"
    }
}
