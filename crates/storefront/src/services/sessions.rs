//! Per-shopper cart and checkout storage.
//!
//! Every browser session is mapped to a shopper id (stored in the
//! tower-session) and every shopper id to one [`ShopperSession`]. The
//! sessions live in an in-memory moka cache and are dropped after the
//! configured idle time, taking the cart with them.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sleek_shop_core::{
    CartState, Checkout, CheckoutError, OrderRecord, PaymentFailure, PaymentReference,
    PaymentResult,
};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

/// Upper bound on concurrently tracked shoppers.
const MAX_SHOPPERS: u64 = 100_000;

/// The cart is locked while a server-side charge is running.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("a payment is already in progress")]
pub struct PaymentInFlight;

/// Cart, checkout and the last placed order of one shopper.
#[derive(Debug, Default)]
pub struct ShopperSession {
    pub cart: CartState,
    pub checkout: Checkout,
    /// Most recent order, kept for the confirmation page.
    pub last_order: Option<OrderRecord>,
    /// Set while a server-side charge is running without the lock held.
    pub payment_in_flight: bool,
}

impl ShopperSession {
    /// Run a cart mutation and keep the checkout in step with it.
    ///
    /// Refused while a charge is in flight. When the edit changed the cart,
    /// a placed checkout is replaced by a fresh one (the order stays in
    /// `last_order`) and a pending checkout is reopened, so the amount is
    /// frozen again on the next submit.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentInFlight`] without running `edit` while a
    /// server-side charge is pending.
    pub fn edit_cart<T>(
        &mut self,
        edit: impl FnOnce(&mut CartState) -> T,
    ) -> Result<T, PaymentInFlight> {
        if self.payment_in_flight {
            return Err(PaymentInFlight);
        }
        let revision = self.cart.revision();
        let outcome = edit(&mut self.cart);
        if self.cart.revision() != revision {
            if self.checkout.phase().is_terminal() {
                debug!("starting a new checkout after placed order");
                self.checkout = Checkout::new();
            } else {
                self.checkout.reopen();
            }
        }
        Ok(outcome)
    }

    /// Apply the outcome of a payment attempt to the checkout.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::InvalidTransition`] when the checkout is not
    /// awaiting payment, e.g. a replayed success signal.
    pub fn apply_payment(
        &mut self,
        outcome: Result<PaymentReference, PaymentFailure>,
    ) -> Result<PaymentResult, CheckoutError> {
        match outcome {
            Ok(reference) => {
                let order = self.checkout.payment_succeeded(reference, &mut self.cart)?;
                self.last_order = Some(order.clone());
                Ok(PaymentResult::Placed(order))
            }
            Err(failure) => {
                self.checkout.payment_failed(failure.clone())?;
                Ok(PaymentResult::Declined(failure))
            }
        }
    }
}

/// Shared handle to one shopper's session.
pub type SharedShopperSession = Arc<Mutex<ShopperSession>>;

/// In-memory store of shopper sessions with idle expiry.
#[derive(Clone)]
pub struct ShopperSessions {
    cache: Cache<Uuid, SharedShopperSession>,
}

impl ShopperSessions {
    /// Create a store that evicts shoppers idle for longer than `idle`.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(MAX_SHOPPERS)
            .time_to_idle(idle)
            .build();
        Self { cache }
    }

    /// Get the session for `shopper`, creating an empty one if needed.
    pub async fn get_or_create(&self, shopper: Uuid) -> SharedShopperSession {
        self.cache
            .get_with(shopper, async {
                debug!(%shopper, "new shopper session");
                Arc::new(Mutex::new(ShopperSession::default()))
            })
            .await
    }

    /// Get the session for `shopper` if it is still live.
    pub async fn get(&self, shopper: Uuid) -> Option<SharedShopperSession> {
        self.cache.get(&shopper).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sleek_shop_core::{CheckoutPhase, CustomerInfo, Price, ProductId};

    use super::*;

    fn customer() -> CustomerInfo {
        CustomerInfo {
            full_name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            address1: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            state: "IL".to_string(),
            zip_code: "62701".to_string(),
            country: "US".to_string(),
            ..CustomerInfo::default()
        }
    }

    fn filled_session() -> ShopperSession {
        let mut session = ShopperSession::default();
        session
            .cart
            .add_item(
                ProductId::parse("tee").unwrap(),
                "Tee",
                Price::from_cents(2500).unwrap(),
                "tee.jpg",
            )
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_same_shopper_gets_same_session() {
        let sessions = ShopperSessions::new(Duration::from_secs(60));
        let shopper = Uuid::new_v4();

        let first = sessions.get_or_create(shopper).await;
        first.lock().await.payment_in_flight = true;
        let second = sessions.get_or_create(shopper).await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.lock().await.payment_in_flight);
        assert!(sessions.get(Uuid::new_v4()).await.is_none());
    }

    #[test]
    fn test_apply_payment_success_keeps_last_order() {
        let mut session = filled_session();
        session.checkout.submit(customer(), &session.cart).unwrap();

        let result = session
            .apply_payment(Ok(PaymentReference::new("PAY-1")))
            .unwrap();

        assert!(matches!(result, PaymentResult::Placed(_)));
        assert!(session.cart.is_empty());
        assert_eq!(
            session.last_order.as_ref().unwrap().payment_reference.as_str(),
            "PAY-1"
        );
    }

    #[test]
    fn test_apply_payment_replay_rejected() {
        let mut session = filled_session();
        session.checkout.submit(customer(), &session.cart).unwrap();
        session
            .apply_payment(Ok(PaymentReference::new("PAY-1")))
            .unwrap();

        let replay = session.apply_payment(Ok(PaymentReference::new("PAY-1")));

        assert!(matches!(replay, Err(CheckoutError::InvalidTransition { .. })));
        assert_eq!(
            session.last_order.as_ref().unwrap().payment_reference.as_str(),
            "PAY-1"
        );
    }

    fn add_cap(cart: &mut CartState) {
        cart.add_item(
            ProductId::parse("cap").unwrap(),
            "Cap",
            Price::from_cents(1000).unwrap(),
            "cap.jpg",
        )
        .unwrap();
    }

    #[test]
    fn test_cart_edit_after_placed_order_starts_new_checkout() {
        let mut session = filled_session();
        session.checkout.submit(customer(), &session.cart).unwrap();
        session
            .apply_payment(Ok(PaymentReference::new("PAY-1")))
            .unwrap();
        assert_eq!(session.checkout.phase(), CheckoutPhase::OrderPlaced);

        session.edit_cart(add_cap).unwrap();

        assert_eq!(session.checkout.phase(), CheckoutPhase::Editing);
        assert!(session.last_order.is_some());
        assert_eq!(session.cart.len(), 1);
    }

    #[test]
    fn test_cart_edit_while_awaiting_payment_reopens_checkout() {
        let mut session = filled_session();
        session.checkout.submit(customer(), &session.cart).unwrap();

        session.edit_cart(add_cap).unwrap();

        assert_eq!(session.checkout.phase(), CheckoutPhase::Editing);
        assert_eq!(session.checkout.payment_amount(), None);
        let late = session.apply_payment(Ok(PaymentReference::new("PAY-1")));
        assert!(matches!(late, Err(CheckoutError::InvalidTransition { .. })));
        assert_eq!(session.cart.len(), 2);
        assert!(session.last_order.is_none());

        let amount = session.checkout.submit(customer(), &session.cart).unwrap();
        assert_eq!(amount, Price::from_cents(3500).unwrap());
    }

    #[test]
    fn test_noop_cart_edit_keeps_pending_checkout() {
        let mut session = filled_session();
        session.checkout.submit(customer(), &session.cart).unwrap();

        session
            .edit_cart(|cart| cart.remove_item(&ProductId::parse("ghost").unwrap()))
            .unwrap();

        assert_eq!(session.checkout.phase(), CheckoutPhase::AwaitingPayment);
        assert_eq!(
            session.checkout.payment_amount(),
            Some(Price::from_cents(2500).unwrap())
        );
    }

    #[test]
    fn test_cart_locked_while_payment_in_flight() {
        let mut session = filled_session();
        session.checkout.submit(customer(), &session.cart).unwrap();
        session.payment_in_flight = true;
        let before = session.cart.clone();

        let result = session.edit_cart(add_cap);

        assert_eq!(result, Err(PaymentInFlight));
        assert_eq!(session.cart, before);
        assert_eq!(session.checkout.phase(), CheckoutPhase::AwaitingPayment);
    }
}
