//! Integration tests for Sleek Shop.
//!
//! The storefront router is driven in-process by the storefront's own
//! [`Shopper`] harness; no server or network is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sleek-shop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `storefront_cart` - Cart flows across requests and sessions
//! - `storefront_checkout` - Submit, sandbox payment, widget callbacks

use serde_json::{Value, json};
use sleek_shop_storefront::config::{PaymentConfig, PaymentProviderKind, StorefrontConfig};
pub use sleek_shop_storefront::testing::{Shopper, TestResponse};

/// Sandbox configuration, optionally declining amounts above `decline_above`.
#[must_use]
pub fn sandbox_config(decline_above: Option<&str>) -> StorefrontConfig {
    StorefrontConfig {
        payments: PaymentConfig {
            provider: PaymentProviderKind::Sandbox,
            sandbox_decline_above: decline_above
                .map(|limit| limit.parse().expect("Invalid decline limit")),
            paypal_client_id: None,
        },
        ..StorefrontConfig::local()
    }
}

/// Widget configuration: payments arrive on the callback route.
#[must_use]
pub fn widget_config() -> StorefrontConfig {
    StorefrontConfig {
        payments: PaymentConfig {
            provider: PaymentProviderKind::Widget,
            sandbox_decline_above: None,
            paypal_client_id: Some("test-client-id".to_string()),
        },
        ..StorefrontConfig::local()
    }
}

/// Customer details that pass checkout validation.
#[must_use]
pub fn complete_customer() -> Value {
    json!({
        "full_name": "Jane Doe",
        "email": "jane@example.com",
        "phone": "+1 555 0100",
        "address1": "1 Main St",
        "address2": "Apt 4",
        "city": "Springfield",
        "state": "IL",
        "zip_code": "62701",
        "country": "US",
    })
}
