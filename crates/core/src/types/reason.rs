//! Cancellation reasons.

use serde::{Deserialize, Serialize};

/// Why a customer cancels, as recorded by the Culto API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CancellationReason {
    // The API spells it this way.
    Acumulation,
    Economic,
    Vacations,
    BadService,
    Logistics,
    DoNotLikeCoffee,
    NoCoffeeOnSummer,
    Travel,
}

impl CancellationReason {
    /// Reasons offered in the picker, in display order. `Travel` is API-only.
    pub const PICKER: [Self; 7] = [
        Self::Acumulation,
        Self::Economic,
        Self::Vacations,
        Self::BadService,
        Self::Logistics,
        Self::DoNotLikeCoffee,
        Self::NoCoffeeOnSummer,
    ];

    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Acumulation => "ACUMULATION",
            Self::Economic => "ECONOMIC",
            Self::Vacations => "VACATIONS",
            Self::BadService => "BAD_SERVICE",
            Self::Logistics => "LOGISTICS",
            Self::DoNotLikeCoffee => "DO_NOT_LIKE_COFFEE",
            Self::NoCoffeeOnSummer => "NO_COFFEE_ON_SUMMER",
            Self::Travel => "TRAVEL",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Acumulation => "Tengo café acumulado en casa",
            Self::Economic => "El precio me resulta alto",
            Self::Vacations => "Me voy de vacaciones",
            Self::BadService => "No estoy conforme con atención al cliente",
            Self::Logistics => "Tuve problemas con las entregas",
            Self::DoNotLikeCoffee => "No me gusta el café que recibo",
            Self::NoCoffeeOnSummer => "No tomo café en verano",
            Self::Travel => "Viaje",
        }
    }
}

impl std::fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for CancellationReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACUMULATION" => Ok(Self::Acumulation),
            "ECONOMIC" => Ok(Self::Economic),
            "VACATIONS" => Ok(Self::Vacations),
            "BAD_SERVICE" => Ok(Self::BadService),
            "LOGISTICS" => Ok(Self::Logistics),
            "DO_NOT_LIKE_COFFEE" => Ok(Self::DoNotLikeCoffee),
            "NO_COFFEE_ON_SUMMER" => Ok(Self::NoCoffeeOnSummer),
            "TRAVEL" => Ok(Self::Travel),
            _ => Err(format!("invalid cancellation reason: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_picker_excludes_travel() {
        assert_eq!(CancellationReason::PICKER.len(), 7);
        assert!(!CancellationReason::PICKER.contains(&CancellationReason::Travel));
        assert_eq!(
            CancellationReason::PICKER.first(),
            Some(&CancellationReason::Acumulation)
        );
    }

    #[test]
    fn test_codes_parse_back() {
        for reason in CancellationReason::PICKER {
            assert_eq!(reason.code().parse::<CancellationReason>(), Ok(reason));
        }
        assert_eq!("TRAVEL".parse(), Ok(CancellationReason::Travel));
        assert!("BORED".parse::<CancellationReason>().is_err());
    }

    #[test]
    fn test_serde_codes() {
        assert_eq!(
            serde_json::to_string(&CancellationReason::NoCoffeeOnSummer).unwrap(),
            "\"NO_COFFEE_ON_SUMMER\""
        );
        assert_eq!(
            serde_json::to_string(&CancellationReason::BadService).unwrap(),
            "\"BAD_SERVICE\""
        );
    }

    #[test]
    fn test_labels() {
        assert_eq!(
            CancellationReason::Economic.label(),
            "El precio me resulta alto"
        );
    }
}
