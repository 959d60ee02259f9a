//! Email address type.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Same shape the portal accepts in the "Datos" form: no whitespace, one
/// `@`, and a domain with a TLD of at least two characters.
static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]{2,}$").unwrap_or_else(|_| unreachable!())
});

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input does not look like `local@domain.tld`.
    #[error("email is malformed")]
    Malformed,
}

impl EmailError {
    /// Message shown next to the email field.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        "Ingresá un email válido."
    }
}

/// A customer email address.
///
/// The value is trimmed before validation, so `" ana@culto.coffee "` parses
/// to `"ana@culto.coffee"`.
///
/// ## Examples
///
/// ```
/// use culto_portal_core::Email;
///
/// assert!(Email::parse("ana@culto.coffee").is_ok());
/// assert!(Email::parse("ana.perez+cafe@mail.com.uy").is_ok());
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("ana@culto").is_err());   // no TLD
/// assert!(Email::parse("ana@culto.c").is_err()); // TLD too short
/// assert!(Email::parse("ana perez@culto.coffee").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse an `Email` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or does not match
    /// `local@domain.tld`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(EmailError::Empty);
        }

        if !EMAIL_PATTERN.is_match(s) {
            return Err(EmailError::Malformed);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
