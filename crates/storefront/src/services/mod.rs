//! Storefront services.
//!
//! - [`payment`] - Sandbox processor and the configured payment gateway
//! - [`sessions`] - Per-shopper cart and checkout storage

pub mod payment;
pub mod sessions;

pub use payment::{PaymentGateway, SandboxProvider};
pub use sessions::{PaymentInFlight, SharedShopperSession, ShopperSession, ShopperSessions};
