//! Static catalog used by the wizards: plans, quantities, grinds and stores.

use serde::{Deserialize, Serialize};

/// A subscription plan the customer can pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// A bag quantity per delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity {
    pub bags: u32,
    pub label: &'static str,
    pub description: &'static str,
}

/// A grind option. Only "En grano" carries a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grind {
    pub label: &'static str,
    pub description: Option<&'static str>,
}

/// A Culto store where subscriptions can be picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Store {
    pub id: &'static str,
    pub name: &'static str,
    pub address: &'static str,
}

impl Store {
    /// `"Epa - Constituyente 2045"`
    #[must_use]
    pub fn summary(&self) -> String {
        format!("{} - {}", self.name, self.address)
    }
}

pub const PLANS: [Plan; 5] = [
    Plan {
        id: "brasil",
        name: "Plan Brasil",
        description: "Solo cafés de Brasil, ideal para métodos filtrados.",
    },
    Plan {
        id: "mundial",
        name: "Plan Mundial",
        description: "Orígenes rotativos de Latinoamérica y África.",
    },
    Plan {
        id: "mix",
        name: "Plan Mix",
        description: "Combinación de cafés clásicos y experimentales.",
    },
    Plan {
        id: "oficina",
        name: "Plan Oficina",
        description: "Pensado para equipos: más cantidad a mejor precio.",
    },
    Plan {
        id: "decaf",
        name: "Plan Decaf",
        description: "Café sin cafeína, sin sacrificar sabor ni calidad.",
    },
];

pub const QUANTITIES: [Quantity; 3] = [
    Quantity {
        bags: 2,
        label: "2 bolsas de 250 g",
        description: "Ideal para 2–3 personas que toman a diario.",
    },
    Quantity {
        bags: 4,
        label: "4 bolsas de 250 g",
        description: "Para equipos pequeños o cafecito intenso todo el mes.",
    },
    Quantity {
        bags: 6,
        label: "6 bolsas de 250 g",
        description: "Pensado para grandes coffee lovers o Plan Oficina.",
    },
];

pub const GRINDS: [Grind; 5] = [
    Grind {
        label: "En grano",
        description: Some("La opción más fresca. Molés justo antes de preparar."),
    },
    Grind {
        label: "Aeropress",
        description: None,
    },
    Grind {
        label: "Cold Brew",
        description: None,
    },
    Grind {
        label: "Espresso",
        description: None,
    },
    Grind {
        label: "Filtrado",
        description: None,
    },
];

pub const STORES: [Store; 4] = [
    Store {
        id: "ciudad-vieja",
        name: "Ciudad Vieja",
        address: "Sarandí 473",
    },
    Store {
        id: "epa",
        name: "Epa",
        address: "Constituyente 2045",
    },
    Store {
        id: "tostaduria",
        name: "Tostaduría",
        address: "Rivera 3220",
    },
    Store {
        id: "punta-carretas",
        name: "Punta Carretas",
        address: "José Ellauri 350",
    },
];

pub const DEPARTAMENTOS: [&str; 3] = ["Montevideo", "Canelones", "Maldonado"];
pub const BARRIOS: [&str; 3] = ["Pocitos", "Centro", "Ciudad Vieja"];
pub const CODIGOS_POSTALES: [&str; 2] = ["11300", "11000"];

pub const DEFAULT_PLAN: Plan = PLANS[0];
pub const DEFAULT_QUANTITY: Quantity = QUANTITIES[0];
pub const DEFAULT_GRIND: Grind = GRINDS[0];
pub const DEFAULT_STORE: Store = STORES[0];

/// Find a plan by catalog id (`"mundial"`).
#[must_use]
pub fn plan_by_id(id: &str) -> Option<Plan> {
    PLANS.iter().copied().find(|p| p.id == id)
}

/// Find a plan by its display name (`"Plan Mundial"`).
#[must_use]
pub fn plan_by_name(name: &str) -> Option<Plan> {
    PLANS.iter().copied().find(|p| p.name == name)
}

#[must_use]
pub fn quantity(bags: u32) -> Option<Quantity> {
    QUANTITIES.iter().copied().find(|q| q.bags == bags)
}

#[must_use]
pub fn grind(label: &str) -> Option<Grind> {
    GRINDS.iter().copied().find(|g| g.label == label)
}

/// Find a store by id or by display name; the API stores the name.
#[must_use]
pub fn store(id_or_name: &str) -> Option<Store> {
    STORES
        .iter()
        .copied()
        .find(|s| s.id == id_or_name || s.name == id_or_name)
}

/// Delivery option picked in the delivery and reactivation wizards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOption {
    #[default]
    Envio,
    Retiro,
}

impl std::str::FromStr for DeliveryOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "envio" => Ok(Self::Envio),
            "retiro" => Ok(Self::Retiro),
            _ => Err(format!("invalid delivery option: {s}")),
        }
    }
}
