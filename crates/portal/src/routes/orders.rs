//! "Pedidos" tab: the customer's last Shopify orders.

use culto_portal_core::format;

use super::admin_token;
use crate::middleware::Portal;
use crate::shopify::{AdminAccess, Order};
use crate::state::AppState;

const ORDERS_FAILED: &str = "No pudimos cargar tus pedidos. Probá de nuevo en unos minutos.";

/// One order card.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub name: String,
    /// `"12 de diciembre"`
    pub date: String,
    /// `"2 × Plan Brasil, 1 × Taza"`
    pub items: String,
    pub delivery: &'static str,
    pub is_pickup: bool,
    pub status_label: &'static str,
    pub status_class: &'static str,
    pub tracking_url: Option<String>,
    pub detail_url: Option<String>,
    /// Pickup orders show their name as the code to give at the counter.
    pub pickup_code: Option<String>,
}

fn is_pickup(order: &Order) -> bool {
    order.shipping_title.as_deref().is_some_and(|title| {
        let title = title.to_lowercase();
        title.contains("retiro") || title.contains("pickup")
    })
}

impl OrderView {
    #[must_use]
    pub fn new(order: &Order) -> Self {
        let pickup = is_pickup(order);
        let fulfilled = order.fulfillment_status == "FULFILLED";
        let (status_label, status_class) = match (fulfilled, pickup) {
            (true, true) => ("Listo para retirar", "status-ready"),
            (true, false) => ("Entregado", "status-delivered"),
            (false, _) => ("En proceso", "status-processing"),
        };

        Self {
            name: order.name.clone(),
            date: format::day_month(order.created_at.date_naive()),
            items: order
                .lines
                .iter()
                .map(|line| format!("{} × {}", line.quantity, line.title))
                .collect::<Vec<_>>()
                .join(", "),
            delivery: if pickup {
                "Retiro en local"
            } else {
                "Envío a domicilio"
            },
            is_pickup: pickup,
            status_label,
            status_class,
            tracking_url: order
                .tracking_url
                .clone()
                .filter(|_| !pickup),
            detail_url: order.status_page_url.clone(),
            pickup_code: pickup.then(|| order.name.clone()),
        }
    }
}

/// Orders for the tab, or the message to show instead.
#[derive(Debug, Clone, Default)]
pub struct OrdersView {
    pub orders: Vec<OrderView>,
    pub error: Option<&'static str>,
}

/// Fetch the customer's orders from the Admin API.
pub(crate) async fn load(state: &AppState, portal: &Portal) -> OrdersView {
    let Some(customer) = portal.state.customer.as_ref() else {
        return OrdersView::default();
    };
    let Some(token) = admin_token(state, portal, &customer.shop).await else {
        tracing::warn!(shop = %customer.shop, "No Admin API token, orders not loaded");
        return OrdersView {
            orders: Vec::new(),
            error: Some(ORDERS_FAILED),
        };
    };
    let access = AdminAccess {
        shop: &customer.shop,
        token: &token,
    };

    match state.admin().customer_orders(&access, &customer.id).await {
        Ok(orders) => OrdersView {
            orders: orders.iter().map(OrderView::new).collect(),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, customer_id = %customer.id, "Failed to load orders");
            OrdersView {
                orders: Vec::new(),
                error: Some(ORDERS_FAILED),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::shopify::OrderLine;

    fn order(status: &str, shipping: Option<&str>) -> Order {
        Order {
            id: "gid://shopify/Order/1".to_string(),
            name: "#1042".to_string(),
            created_at: DateTime::parse_from_rfc3339("2026-12-12T15:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            fulfillment_status: status.to_string(),
            status_page_url: Some("https://culto.coffee/orders/abc".to_string()),
            shipping_title: shipping.map(str::to_string),
            lines: vec![
                OrderLine {
                    title: "Plan Brasil".to_string(),
                    quantity: 2,
                },
                OrderLine {
                    title: "Taza".to_string(),
                    quantity: 1,
                },
            ],
            tracking_url: Some("https://track.example/1042".to_string()),
        }
    }

    #[test]
    fn test_shipped_order() {
        let view = OrderView::new(&order("FULFILLED", Some("Envío a domicilio")));
        assert_eq!(view.date, "12 de diciembre");
        assert_eq!(view.items, "2 × Plan Brasil, 1 × Taza");
        assert_eq!(view.delivery, "Envío a domicilio");
        assert_eq!(view.status_label, "Entregado");
        assert!(view.tracking_url.is_some());
        assert!(view.pickup_code.is_none());
    }

    #[test]
    fn test_pickup_order_ready() {
        let view = OrderView::new(&order("FULFILLED", Some("Retiro en Ciudad Vieja")));
        assert!(view.is_pickup);
        assert_eq!(view.status_label, "Listo para retirar");
        assert_eq!(view.pickup_code.as_deref(), Some("#1042"));
        assert!(view.tracking_url.is_none());
    }

    #[test]
    fn test_unfulfilled_is_in_progress() {
        let view = OrderView::new(&order("UNFULFILLED", Some("Local pickup")));
        assert!(view.is_pickup);
        assert_eq!(view.status_label, "En proceso");

        let view = OrderView::new(&order("IN_PROGRESS", None));
        assert!(!view.is_pickup);
        assert_eq!(view.status_label, "En proceso");
    }
}
