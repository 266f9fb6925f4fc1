//! Status enums for checkout.

use serde::{Deserialize, Serialize};

/// Where a checkout currently stands.
///
/// Payment success and payment failure are events, not resting places: a
/// success moves straight on to [`CheckoutPhase::OrderPlaced`] and a failure
/// drops back into [`CheckoutPhase::AwaitingPayment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    /// Customer details are still being filled in.
    #[default]
    Editing,
    /// Details validated; the amount is frozen and payment is pending.
    AwaitingPayment,
    /// Terminal: the cart was cleared and an order record emitted.
    OrderPlaced,
}

impl CheckoutPhase {
    /// Returns `true` once no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::OrderPlaced)
    }
}

impl std::fmt::Display for CheckoutPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Editing => write!(f, "editing"),
            Self::AwaitingPayment => write!(f, "awaiting_payment"),
            Self::OrderPlaced => write!(f, "order_placed"),
        }
    }
}

/// Inputs that drive the checkout state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutAction {
    /// Customer details submitted.
    Submit,
    /// Payment requested from a provider.
    Pay,
    /// The payment collaborator reported success.
    PaymentSucceeded,
    /// The payment collaborator reported failure.
    PaymentFailed,
}

impl std::fmt::Display for CheckoutAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::Pay => write!(f, "pay"),
            Self::PaymentSucceeded => write!(f, "payment_succeeded"),
            Self::PaymentFailed => write!(f, "payment_failed"),
        }
    }
}
