//! Checkout orchestration.
//!
//! A [`Checkout`] walks one purchase through
//! `Editing → AwaitingPayment → OrderPlaced`:
//!
//! 1. [`Checkout::submit`] validates the cart and the customer details and
//!    freezes the amount to charge.
//! 2. The payment outcome arrives either through [`Checkout::pay`] (which
//!    awaits a [`PaymentProvider`]) or as a signal relayed from an external
//!    widget via [`Checkout::payment_succeeded`] / [`Checkout::payment_failed`].
//! 3. A success finalizes the order exactly once: the cart is cleared and an
//!    [`OrderRecord`] is returned. A failure leaves the cart alone and keeps
//!    the checkout waiting for another attempt.
//!
//! A host that lets the cart change while payment is pending calls
//! [`Checkout::reopen`], which sends the checkout back to `Editing` so the
//! next submit freezes the new amount.
//!
//! Finalization is gated on the phase being `AwaitingPayment`, so a replayed
//! success signal is rejected instead of clearing the cart a second time.

mod customer;
mod error;
mod order;

pub use customer::{CustomerField, CustomerInfo};
pub use error::{CheckoutError, ValidationError, Violation};
pub use order::OrderRecord;

use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::cart::CartState;
use crate::payment::{PaymentFailure, PaymentProvider, PaymentReference};
use crate::types::{CheckoutAction, CheckoutPhase, OrderNumber, Price};

#[derive(Debug, Clone, Default)]
enum CheckoutState {
    #[default]
    Editing,
    AwaitingPayment {
        customer: CustomerInfo,
        amount: Price,
    },
    OrderPlaced(Box<OrderRecord>),
}

impl CheckoutState {
    const fn phase(&self) -> CheckoutPhase {
        match self {
            Self::Editing => CheckoutPhase::Editing,
            Self::AwaitingPayment { .. } => CheckoutPhase::AwaitingPayment,
            Self::OrderPlaced(_) => CheckoutPhase::OrderPlaced,
        }
    }
}

/// Outcome of [`Checkout::pay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentResult {
    /// Payment captured and order finalized.
    Placed(OrderRecord),
    /// Payment declined; the checkout is awaiting another attempt.
    Declined(PaymentFailure),
}

/// One checkout session's state machine.
///
/// Holds no reference to the cart; every call that needs it borrows it, so
/// the owner decides how the pair is shared.
#[derive(Debug, Clone, Default)]
pub struct Checkout {
    state: CheckoutState,
    last_failure: Option<PaymentFailure>,
}

impl Checkout {
    /// Start a checkout in the `Editing` phase.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn phase(&self) -> CheckoutPhase {
        self.state.phase()
    }

    /// Customer details accepted by the last successful submit.
    #[must_use]
    pub fn customer(&self) -> Option<&CustomerInfo> {
        match &self.state {
            CheckoutState::AwaitingPayment { customer, .. } => Some(customer),
            CheckoutState::OrderPlaced(order) => Some(&order.customer_info),
            CheckoutState::Editing => None,
        }
    }

    /// The frozen amount to charge, while awaiting payment.
    #[must_use]
    pub const fn payment_amount(&self) -> Option<Price> {
        match &self.state {
            CheckoutState::AwaitingPayment { amount, .. } => Some(*amount),
            _ => None,
        }
    }

    /// The placed order, once the checkout is complete.
    #[must_use]
    pub fn order(&self) -> Option<&OrderRecord> {
        match &self.state {
            CheckoutState::OrderPlaced(order) => Some(order.as_ref()),
            _ => None,
        }
    }

    /// Reason of the most recent declined payment, cleared on resubmit or
    /// success.
    #[must_use]
    pub const fn last_failure(&self) -> Option<&PaymentFailure> {
        self.last_failure.as_ref()
    }

    /// Submit customer details and move to `AwaitingPayment`.
    ///
    /// An empty cart is rejected before the details are looked at. Resubmitting
    /// while awaiting payment replaces the details and refreshes the amount.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::Validation`] listing `EmptyCart`, or every missing
    ///   field and a malformed email.
    /// - [`CheckoutError::InvalidTransition`] if the order was already placed.
    #[instrument(skip_all, fields(phase = %self.phase()))]
    pub fn submit(
        &mut self,
        customer: CustomerInfo,
        cart: &CartState,
    ) -> Result<Price, CheckoutError> {
        if cart.is_empty() {
            return Err(ValidationError::new(vec![Violation::EmptyCart]).into());
        }
        if self.phase().is_terminal() {
            return Err(self.reject(CheckoutAction::Submit));
        }

        let violations = customer.violations();
        if !violations.is_empty() {
            info!(count = violations.len(), "checkout details rejected");
            return Err(ValidationError::new(violations).into());
        }

        let amount = cart.total_price();
        info!(%amount, items = cart.total_item_count(), "awaiting payment");
        self.state = CheckoutState::AwaitingPayment { customer, amount };
        self.last_failure = None;
        Ok(amount)
    }

    /// Drop a pending checkout back to `Editing` after the cart changed.
    ///
    /// The frozen amount no longer matches the cart, so the customer has to
    /// submit again before any payment signal is accepted. Returns `true` if
    /// a pending checkout was reopened; other phases are left as they are.
    pub fn reopen(&mut self) -> bool {
        if !matches!(self.state, CheckoutState::AwaitingPayment { .. }) {
            return false;
        }
        info!("cart changed, checkout reopened for editing");
        self.state = CheckoutState::Editing;
        self.last_failure = None;
        true
    }

    /// Apply a payment success signal and finalize the order.
    ///
    /// Only valid while awaiting payment; the cart is cleared and the record
    /// returned exactly once.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] in any other phase, including a
    /// replay after the order was placed. The cart is left untouched.
    #[instrument(skip_all, fields(reference = %reference))]
    pub fn payment_succeeded(
        &mut self,
        reference: PaymentReference,
        cart: &mut CartState,
    ) -> Result<OrderRecord, CheckoutError> {
        let (customer, amount) = match std::mem::take(&mut self.state) {
            CheckoutState::AwaitingPayment { customer, amount } => (customer, amount),
            other => {
                self.state = other;
                return Err(self.reject(CheckoutAction::PaymentSucceeded));
            }
        };

        let snapshot = cart.snapshot();
        if snapshot.total_price != amount {
            warn!(
                charged = %amount,
                cart_total = %snapshot.total_price,
                "cart changed while payment was pending"
            );
        }

        let order = OrderRecord {
            order_number: OrderNumber::generate(),
            customer_info: customer,
            order_total: snapshot.total_price,
            payment_reference: reference,
            lines: snapshot.lines,
            item_count: snapshot.total_item_count,
            placed_at: Utc::now(),
        };
        cart.clear();
        self.last_failure = None;
        self.state = CheckoutState::OrderPlaced(Box::new(order.clone()));

        info!(
            order_number = %order.order_number,
            total = %order.order_total,
            "order placed"
        );
        Ok(order)
    }

    /// Apply a payment failure signal. The cart is never touched and the
    /// checkout stays in `AwaitingPayment` so the customer can retry.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] outside `AwaitingPayment`.
    pub fn payment_failed(&mut self, failure: PaymentFailure) -> Result<(), CheckoutError> {
        if self.phase() != CheckoutPhase::AwaitingPayment {
            return Err(self.reject(CheckoutAction::PaymentFailed));
        }
        warn!(reason = %failure, "payment failed");
        self.last_failure = Some(failure);
        Ok(())
    }

    /// Charge the frozen amount through `provider` and apply the outcome.
    ///
    /// # Errors
    ///
    /// [`CheckoutError::InvalidTransition`] unless awaiting payment.
    pub async fn pay<P: PaymentProvider>(
        &mut self,
        cart: &mut CartState,
        provider: &P,
    ) -> Result<PaymentResult, CheckoutError> {
        let amount = self
            .payment_amount()
            .ok_or_else(|| self.reject(CheckoutAction::Pay))?;

        match provider.initiate(amount).await {
            Ok(reference) => self
                .payment_succeeded(reference, cart)
                .map(PaymentResult::Placed),
            Err(failure) => {
                self.payment_failed(failure.clone())?;
                Ok(PaymentResult::Declined(failure))
            }
        }
    }

    fn reject(&self, action: CheckoutAction) -> CheckoutError {
        let phase = self.phase();
        warn!(%phase, %action, "checkout transition rejected");
        CheckoutError::InvalidTransition { phase, action }
    }
}
