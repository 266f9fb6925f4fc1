//! Types stored in the browser session.

/// Session keys used across the storefront.
pub mod session_keys {
    /// Shopper id mapping the browser session to its cart and checkout.
    pub const SHOPPER_ID: &str = "shopper_id";
}
