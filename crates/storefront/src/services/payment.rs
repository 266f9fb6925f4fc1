//! Payment providers available to the storefront.

use sleek_shop_core::{PaymentFailure, PaymentProvider, PaymentReference, Price};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{PaymentConfig, PaymentProviderKind};

/// Simulated processor for development and tests.
///
/// Approves every amount up to `decline_above` (inclusive) with a
/// `SANDBOX-<uuid>` reference and declines anything larger.
#[derive(Debug, Clone, Default)]
pub struct SandboxProvider {
    decline_above: Option<Price>,
}

impl SandboxProvider {
    #[must_use]
    pub const fn new(decline_above: Option<Price>) -> Self {
        Self { decline_above }
    }
}

impl PaymentProvider for SandboxProvider {
    async fn initiate(&self, amount: Price) -> Result<PaymentReference, PaymentFailure> {
        if let Some(limit) = self.decline_above.filter(|limit| amount > *limit) {
            debug!(%amount, %limit, "sandbox declining payment");
            return Err(PaymentFailure::new(format!(
                "sandbox declines amounts above {limit}"
            )));
        }
        let reference = PaymentReference::new(format!("SANDBOX-{}", Uuid::new_v4().simple()));
        info!(%amount, %reference, "sandbox payment captured");
        Ok(reference)
    }
}

/// The payment path configured for this deployment.
#[derive(Debug, Clone)]
pub enum PaymentGateway {
    /// Charges are made server-side through the sandbox.
    Sandbox(SandboxProvider),
    /// Charges are made in the browser; outcomes arrive on the callback route.
    Widget {
        /// Public client id for the widget script, if configured.
        client_id: Option<String>,
    },
}

impl PaymentGateway {
    /// Build the gateway from configuration.
    #[must_use]
    pub fn from_config(config: &PaymentConfig) -> Self {
        match config.provider {
            PaymentProviderKind::Sandbox => {
                Self::Sandbox(SandboxProvider::new(config.sandbox_decline_above))
            }
            PaymentProviderKind::Widget => Self::Widget {
                client_id: config.paypal_client_id.clone(),
            },
        }
    }

    /// The provider for server-side charges, if this gateway makes them.
    #[must_use]
    pub const fn server_side(&self) -> Option<&SandboxProvider> {
        match self {
            Self::Sandbox(provider) => Some(provider),
            Self::Widget { .. } => None,
        }
    }

    /// Stable name reported to clients.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sandbox(_) => "sandbox",
            Self::Widget { .. } => "widget",
        }
    }

    /// Client id the browser needs to render the widget.
    #[must_use]
    pub fn widget_client_id(&self) -> Option<&str> {
        match self {
            Self::Widget { client_id } => client_id.as_deref(),
            Self::Sandbox(_) => None,
        }
    }
}
