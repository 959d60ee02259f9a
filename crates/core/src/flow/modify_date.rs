//! Modify-date wizard: pick a day → card → confirmed.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{BackOutcome, FlowError};
use crate::format;
use crate::validation::{CardForm, CardSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DateStep {
    #[default]
    #[serde(rename = "step-1")]
    PickDay,
    #[serde(rename = "step-2")]
    Payment,
    #[serde(rename = "step-confirm")]
    Confirmed,
}

/// When the new date starts applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Billing {
    #[default]
    NextMonth,
    ThisMonth,
}

impl Billing {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NextMonth => "next-month",
            Self::ThisMonth => "this-month",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::NextMonth => "Desde el próximo mes (sin cobro extra ahora)",
            Self::ThisMonth => "Este mes (se genera un cobro extra y recibís doble café)",
        }
    }
}

impl std::str::FromStr for Billing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "next-month" => Ok(Self::NextMonth),
            "this-month" => Ok(Self::ThisMonth),
            _ => Err(format!("invalid billing option: {s}")),
        }
    }
}

/// One cell of the month calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub day: u32,
    pub is_today: bool,
    pub selectable: bool,
    pub selected: bool,
}

/// State of the modify-date overlay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DateWizard {
    step: DateStep,
    day: Option<u32>,
    billing: Billing,
    new_date: Option<NaiveDate>,
    card: Option<CardSummary>,
}

/// Compute the next charge date for a picked `day` of the current month.
///
/// Days before today, and later days billed from next month, land on that
/// day of next month, clamped to its length. `ThisMonth` keeps the current
/// month.
#[must_use]
pub fn next_charge_date(day: u32, billing: Billing, today: NaiveDate) -> NaiveDate {
    let this_month = today.with_day(1).unwrap_or(today);
    let target_month = if day < today.day() || billing == Billing::NextMonth {
        this_month
            .checked_add_months(Months::new(1))
            .unwrap_or(this_month)
    } else {
        this_month
    };
    let day = day.clamp(1, format::days_in_month(target_month));
    target_month.with_day(day).unwrap_or(target_month)
}

impl DateWizard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn step(&self) -> DateStep {
        self.step
    }

    #[must_use]
    pub const fn day(&self) -> Option<u32> {
        self.day
    }

    #[must_use]
    pub const fn billing(&self) -> Billing {
        self.billing
    }

    #[must_use]
    pub const fn new_date(&self) -> Option<NaiveDate> {
        self.new_date
    }

    #[must_use]
    pub const fn card(&self) -> Option<&CardSummary> {
        self.card.as_ref()
    }

    #[must_use]
    pub const fn title(&self) -> &'static str {
        "MODIFICAR FECHA"
    }

    /// `"Paso N de 2"`, or `None` on the confirmation screen.
    #[must_use]
    pub fn step_label(&self) -> Option<String> {
        match self.step {
            DateStep::PickDay => Some("Paso 1 de 2".to_owned()),
            DateStep::Payment => Some("Paso 2 de 2".to_owned()),
            DateStep::Confirmed => None,
        }
    }

    /// The billing choice is shown only for days after today.
    #[must_use]
    pub fn shows_billing_choice(&self, today: NaiveDate) -> bool {
        self.day.is_some_and(|d| d > today.day())
    }

    /// The date the wizard would set with the current selections.
    #[must_use]
    pub fn preview(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.day.map(|d| next_charge_date(d, self.billing, today))
    }

    /// The current month's grid for step 1.
    #[must_use]
    pub fn calendar(&self, today: NaiveDate) -> Vec<CalendarDay> {
        (1..=format::days_in_month(today))
            .map(|day| CalendarDay {
                day,
                is_today: day == today.day(),
                selectable: day != today.day(),
                selected: self.day == Some(day),
            })
            .collect()
    }

    /// Pick a day of the current month.
    ///
    /// # Errors
    ///
    /// [`FlowError::DayNotSelectable`] for today or a day outside the month.
    pub fn select_day(&mut self, day: u32, today: NaiveDate) -> Result<(), FlowError> {
        if self.step != DateStep::PickDay {
            return Err(FlowError::InvalidAction);
        }
        if day == 0 || day > format::days_in_month(today) || day == today.day() {
            return Err(FlowError::DayNotSelectable);
        }
        self.day = Some(day);
        if day < today.day() {
            self.billing = Billing::NextMonth;
        }
        Ok(())
    }

    /// Pick the billing option; ignored unless the picked day is after today.
    pub fn select_billing(&mut self, billing: Billing, today: NaiveDate) {
        if self.shows_billing_choice(today) {
            self.billing = billing;
        }
    }

    /// Step 1 → step 2.
    ///
    /// # Errors
    ///
    /// [`FlowError::DayRequired`] when no day was picked.
    pub fn continue_to_payment(&mut self) -> Result<(), FlowError> {
        if self.step != DateStep::PickDay {
            return Err(FlowError::InvalidAction);
        }
        if self.day.is_none() {
            return Err(FlowError::DayRequired);
        }
        self.step = DateStep::Payment;
        Ok(())
    }

    /// Validate the card and compute the date to PATCH.
    ///
    /// # Errors
    ///
    /// [`FlowError::CardIncomplete`] when the card form is not filled.
    pub fn confirm_request(
        &self,
        card: &CardForm,
        today: NaiveDate,
    ) -> Result<(NaiveDate, CardSummary), FlowError> {
        if self.step != DateStep::Payment {
            return Err(FlowError::InvalidAction);
        }
        let day = self.day.ok_or(FlowError::DayRequired)?;
        let summary = card.summary().ok_or(FlowError::CardIncomplete)?;
        Ok((next_charge_date(day, self.billing, today), summary))
    }

    /// Move to the confirmation screen after the PATCH succeeded.
    pub fn mark_confirmed(&mut self, date: NaiveDate, card: CardSummary) {
        self.new_date = Some(date);
        self.card = Some(card);
        self.step = DateStep::Confirmed;
    }

    pub(super) fn back(&mut self) -> BackOutcome {
        match self.step {
            DateStep::PickDay => BackOutcome::Close,
            DateStep::Payment => {
                self.step = DateStep::PickDay;
                BackOutcome::Moved
            }
            DateStep::Confirmed => {
                self.step = DateStep::Payment;
                BackOutcome::Moved
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn filled_card() -> CardForm {
        CardForm {
            card_holder: "Ana Pérez".to_owned(),
            card_number: "5500 0000 0000 0004".to_owned(),
            card_expiry: "12/29".to_owned(),
            card_cvv: "123".to_owned(),
        }
    }

    #[test]
    fn test_next_charge_date_rules() {
        let today = date(2026, 10, 18);
        assert_eq!(next_charge_date(5, Billing::ThisMonth, today), date(2026, 11, 5));
        assert_eq!(next_charge_date(25, Billing::NextMonth, today), date(2026, 11, 25));
        assert_eq!(next_charge_date(25, Billing::ThisMonth, today), date(2026, 10, 25));
    }

    #[test]
    fn test_next_charge_date_clamps_month_length() {
        assert_eq!(
            next_charge_date(31, Billing::NextMonth, date(2026, 1, 15)),
            date(2026, 2, 28)
        );
        assert_eq!(
            next_charge_date(30, Billing::NextMonth, date(2024, 1, 10)),
            date(2024, 2, 29)
        );
        assert_eq!(
            next_charge_date(31, Billing::NextMonth, date(2026, 10, 2)),
            date(2026, 11, 30)
        );
    }

    #[test]
    fn test_next_charge_date_crosses_year() {
        assert_eq!(
            next_charge_date(3, Billing::NextMonth, date(2026, 12, 20)),
            date(2027, 1, 3)
        );
    }

    #[test]
    fn test_today_not_selectable() {
        let today = date(2026, 10, 18);
        let mut wizard = DateWizard::new();
        assert_eq!(wizard.select_day(18, today), Err(FlowError::DayNotSelectable));
        assert_eq!(wizard.select_day(32, today), Err(FlowError::DayNotSelectable));

        let cells = wizard.calendar(today);
        assert_eq!(cells.len(), 31);
        let today_cell = cells.iter().find(|c| c.is_today).unwrap();
        assert_eq!(today_cell.day, 18);
        assert!(!today_cell.selectable);
    }

    #[test]
    fn test_day_before_today_forces_next_month() {
        let today = date(2026, 10, 18);
        let mut wizard = DateWizard::new();
        wizard.select_day(25, today).unwrap();
        wizard.select_billing(Billing::ThisMonth, today);
        assert_eq!(wizard.billing(), Billing::ThisMonth);
        assert!(wizard.shows_billing_choice(today));

        wizard.select_day(3, today).unwrap();
        assert_eq!(wizard.billing(), Billing::NextMonth);
        assert!(!wizard.shows_billing_choice(today));

        wizard.select_billing(Billing::ThisMonth, today);
        assert_eq!(wizard.billing(), Billing::NextMonth);
        assert_eq!(wizard.preview(today), Some(date(2026, 11, 3)));
    }

    #[test]
    fn test_continue_requires_day() {
        let mut wizard = DateWizard::new();
        assert_eq!(wizard.continue_to_payment(), Err(FlowError::DayRequired));
    }

    #[test]
    fn test_confirm_requires_filled_card() {
        let today = date(2026, 10, 18);
        let mut wizard = DateWizard::new();
        wizard.select_day(20, today).unwrap();
        wizard.continue_to_payment().unwrap();

        assert_eq!(
            wizard.confirm_request(&CardForm::default(), today),
            Err(FlowError::CardIncomplete)
        );

        let (new_date, card) = wizard.confirm_request(&filled_card(), today).unwrap();
        assert_eq!(new_date, date(2026, 11, 20));
        assert_eq!(card.display(), "Mastercard •••• 0004");

        wizard.mark_confirmed(new_date, card);
        assert_eq!(wizard.step(), DateStep::Confirmed);
        assert_eq!(wizard.step_label(), None);
    }

    #[test]
    fn test_back_rules() {
        let today = date(2026, 10, 18);
        let mut wizard = DateWizard::new();
        wizard.select_day(20, today).unwrap();
        wizard.continue_to_payment().unwrap();
        wizard.mark_confirmed(date(2026, 11, 20), CardSummary::placeholder());

        assert_eq!(wizard.back(), BackOutcome::Moved);
        assert_eq!(wizard.step(), DateStep::Payment);
        assert_eq!(wizard.back(), BackOutcome::Moved);
        assert_eq!(wizard.step(), DateStep::PickDay);
        assert_eq!(wizard.back(), BackOutcome::Close);
    }
}
