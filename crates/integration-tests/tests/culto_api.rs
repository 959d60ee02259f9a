//! Tests for the Culto REST API client.
//!
//! The live tests require:
//! - `CULTO_API_BASE_URL` and `CULTO_API_TOKEN` in the environment
//! - `CULTO_TEST_EMAIL` for a customer with at least one subscription
//!
//! Run with: cargo test -p culto-portal-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use culto_portal::config::CultoApiConfig;
use culto_portal::culto::CultoClient;
use culto_portal_integration_tests::test_config;

fn live_client() -> CultoClient {
    CultoClient::new(&CultoApiConfig::from_env().unwrap())
}

#[tokio::test]
async fn test_unreachable_api_is_an_error() {
    let client = CultoClient::new(&test_config(false).culto);

    assert!(client.subscriptions("ana@example.com").await.is_err());
    assert!(client.prices().await.is_err());
}

#[tokio::test]
#[ignore = "Requires Culto API credentials"]
async fn test_prices_are_cached() {
    let client = live_client();

    let first = client.prices().await.unwrap();
    assert!(!first.is_empty());

    let second = client.prices().await.unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[tokio::test]
#[ignore = "Requires Culto API credentials and CULTO_TEST_EMAIL"]
async fn test_subscriptions_for_known_customer() {
    let client = live_client();
    let email = std::env::var("CULTO_TEST_EMAIL").unwrap();

    let subscriptions = client.subscriptions(&email).await.unwrap();
    assert!(!subscriptions.is_empty());
}
