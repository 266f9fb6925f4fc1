//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::services::{PaymentGateway, ShopperSessions};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// shopper sessions, the payment gateway and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    sessions: ShopperSessions,
    payments: PaymentGateway,
}

impl AppState {
    /// Create a new application state from configuration.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let sessions = ShopperSessions::new(config.session_idle);
        let payments = PaymentGateway::from_config(&config.payments);

        Self {
            inner: Arc::new(AppStateInner {
                config,
                sessions,
                payments,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the shopper session store.
    #[must_use]
    pub fn sessions(&self) -> &ShopperSessions {
        &self.inner.sessions
    }

    /// Get a reference to the configured payment gateway.
    #[must_use]
    pub fn payments(&self) -> &PaymentGateway {
        &self.inner.payments
    }
}
