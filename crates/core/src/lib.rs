//! Sleek Shop Core - cart and checkout library.
//!
//! This crate holds the stateful heart of the storefront:
//! - `storefront` - JSON service hosting one cart and checkout per shopper
//! - `integration-tests` - end-to-end tests against the storefront router
//!
//! # Architecture
//!
//! The core crate does no I/O. It has no HTTP client, no database, no global
//! state. Payment capture is an injected [`PaymentProvider`], and every cart is
//! an explicitly constructed [`CartState`] owned by whoever hosts the session.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and statuses
//! - [`cart`] - Line items with totals that never drift
//! - [`checkout`] - Validation, payment orchestration, order finalization
//! - [`payment`] - The payment collaborator contract

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod payment;
pub mod types;

pub use cart::{CartError, CartLine, CartSnapshot, CartState};
pub use checkout::{
    Checkout, CheckoutError, CustomerField, CustomerInfo, OrderRecord, PaymentResult,
    ValidationError, Violation,
};
pub use payment::{PaymentFailure, PaymentProvider, PaymentReference};
pub use types::*;
