//! Spanish (Rioplatense) date rendering.

use chrono::{Datelike, Months, NaiveDate};

pub const MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

pub const WEEKDAYS: [&str; 7] = [
    "Domingo",
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
];

/// Calendar column headers, Sunday first.
pub const WEEKDAY_INITIALS: [&str; 7] = ["Dom", "Lun", "Mar", "Mié", "Jue", "Vie", "Sáb"];

fn month_name(date: NaiveDate) -> &'static str {
    MONTHS
        .get(date.month0() as usize)
        .copied()
        .unwrap_or_default()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// `"12 de diciembre"`
#[must_use]
pub fn day_month(date: NaiveDate) -> String {
    format!("{} de {}", date.day(), month_name(date))
}

/// `"Jueves 12 de diciembre"`
#[must_use]
pub fn weekday_day_month(date: NaiveDate) -> String {
    let weekday = WEEKDAYS
        .get(date.weekday().num_days_from_sunday() as usize)
        .copied()
        .unwrap_or_default();
    format!("{weekday} {}", day_month(date))
}

/// `"Diciembre 2026"`
#[must_use]
pub fn month_year(date: NaiveDate) -> String {
    format!("{} {}", capitalize(month_name(date)), date.year())
}

/// Number of days in `date`'s month.
#[must_use]
pub fn days_in_month(date: NaiveDate) -> u32 {
    let first = date.with_day(1).unwrap_or(date);
    first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

/// Blank cells before day 1 in a Sunday-first calendar grid.
#[must_use]
pub fn leading_blanks(date: NaiveDate) -> u32 {
    date.with_day(1)
        .unwrap_or(date)
        .weekday()
        .num_days_from_sunday()
}
