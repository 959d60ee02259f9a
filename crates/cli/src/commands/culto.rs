//! Culto API commands.
//!
//! # Environment Variables
//!
//! - `CULTO_API_TOKEN` - Bearer token for the Culto API
//! - `CULTO_API_BASE_URL` - API base URL (optional)

use culto_portal::config::{ConfigError, CultoApiConfig};
use culto_portal::culto::{CultoClient, CultoError};
use culto_portal_core::{FlowType, Subscription, current_subscription};
use thiserror::Error;

/// Errors that can occur while talking to the Culto API.
#[derive(Debug, Error)]
pub enum CultoCommandError {
    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The API call failed.
    #[error("Culto API error: {0}")]
    Api(#[from] CultoError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
}

fn client() -> Result<CultoClient, CultoCommandError> {
    dotenvy::dotenv().ok();
    let config = CultoApiConfig::from_env()?;
    Ok(CultoClient::new(&config))
}

fn check_email(email: &str) -> Result<(), CultoCommandError> {
    if culto_portal_core::validation::validate_email(email).is_ok() {
        Ok(())
    } else {
        Err(CultoCommandError::InvalidEmail(email.to_owned()))
    }
}

/// One line per subscription; the current one is starred.
fn subscription_line(subscription: &Subscription, current: bool) -> String {
    format!(
        "{} {} | {} | {} | next charge {} | {}",
        if current { "*" } else { " " },
        subscription.id,
        subscription.status,
        subscription.plan_name(),
        subscription.next_charge_date,
        subscription.delivery_method.label(),
    )
}

/// List a customer's subscriptions.
///
/// # Errors
///
/// Returns an error if the email is invalid, the configuration is
/// incomplete, or the API call fails.
pub async fn subscriptions(email: &str) -> Result<(), CultoCommandError> {
    check_email(email)?;
    let client = client()?;

    tracing::info!("Fetching subscriptions for {}", email);
    let subscriptions = client.subscriptions(email).await?;
    let current = current_subscription(&subscriptions).map(|s| s.id.clone());

    if subscriptions.is_empty() {
        tracing::info!("No subscriptions found");
        return Ok(());
    }

    #[allow(clippy::print_stdout)]
    for subscription in &subscriptions {
        println!(
            "{}",
            subscription_line(subscription, current.as_deref() == Some(subscription.id.as_str()))
        );
    }
    Ok(())
}

/// List the price catalog.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or the API call fails.
pub async fn prices() -> Result<(), CultoCommandError> {
    let client = client()?;
    let prices = client.prices().await?;

    #[allow(clippy::print_stdout)]
    for price in prices.iter() {
        println!(
            "{} | {} | {} bolsas | product {}",
            price.id,
            price.plan_name(),
            price.bag_amount,
            price.shopify_product_id,
        );
    }
    Ok(())
}

/// Apply a coupon to the customer's subscription.
///
/// # Errors
///
/// Returns an error if the email is invalid, the configuration is
/// incomplete, or the API rejects the coupon.
pub async fn coupon(email: &str, flow: FlowType) -> Result<(), CultoCommandError> {
    check_email(email)?;
    let client = client()?;

    tracing::info!("Applying {} coupon for {}", flow, email);
    let response = client.apply_coupon(email, flow).await?;
    tracing::info!("Coupon applied: {}", response);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_email() {
        assert!(matches!(
            check_email("not-an-email"),
            Err(CultoCommandError::InvalidEmail(_))
        ));
        assert!(check_email("ana@example.com").is_ok());
    }
}
