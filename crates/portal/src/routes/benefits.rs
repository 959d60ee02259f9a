//! "Beneficios" tab: subscriber pass and benefit cards.

use culto_portal_core::{Subscription, SubscriptionStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Benefit {
    pub title: &'static str,
    pub location: &'static str,
    pub description: &'static str,
    pub footnote: Option<&'static str>,
}

pub const BENEFITS: [Benefit; 4] = [
    Benefit {
        title: "50% de descuento en bebidas de café",
        location: "Locales físicos",
        description: "Mostrá tu pase de suscriptor en caja. El descuento aplica en bebidas de café en nuestros locales.",
        footnote: Some(
            "Beneficio personal. No se transfiere y es válido mientras tu suscripción esté activa.",
        ),
    },
    Benefit {
        title: "Envío gratis a todo Uruguay",
        location: "Online",
        description: "Disponible en tus suscripciones y compras únicas desde la web, sin monto mínimo.",
        footnote: None,
    },
    Benefit {
        title: "25% off en compras de 250 g",
        location: "Online",
        description: "Válido en bolsas de 250 g fuera de tu suscripción. Se aplica automáticamente al comprar logueado con tu cuenta.",
        footnote: None,
    },
    Benefit {
        title: "10% de descuento en kiosko",
        location: "Kiosko",
        description: "Aplicable en productos de kiosko en locales Culto. Mostrá tu pase de suscriptor al momento de pagar.",
        footnote: None,
    },
];

/// Display data for the "Beneficios" tab.
#[derive(Debug, Clone)]
pub struct BenefitsView {
    pub has_subscription: bool,
    pub is_active: bool,
    pub pass_label: &'static str,
    pub plan_name: String,
    pub first_name: String,
    pub benefits: &'static [Benefit],
}

impl BenefitsView {
    #[must_use]
    pub fn new(
        status: SubscriptionStatus,
        current: Option<&Subscription>,
        first_name: &str,
    ) -> Self {
        let is_active = status.is_active();
        Self {
            has_subscription: current.is_some(),
            is_active,
            pass_label: if is_active {
                "SUSCRIPCIÓN ACTIVA"
            } else {
                "SUSCRIPCIÓN PAUSADA"
            },
            plan_name: current.map(Subscription::plan_name).unwrap_or_default(),
            first_name: first_name.to_owned(),
            benefits: if is_active { &BENEFITS } else { &[] },
        }
    }
}
