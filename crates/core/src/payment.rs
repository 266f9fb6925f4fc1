//! Payment collaborator interface.
//!
//! The checkout never talks to a payment processor directly. It is handed a
//! [`PaymentProvider`] and treats whatever comes back as opaque data: a
//! reference to store on the order, or a reason to show the customer.

use core::fmt;
use core::future::Future;

use serde::{Deserialize, Serialize};

use crate::types::Price;

/// Opaque identifier of a captured payment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentReference(String);

impl PaymentReference {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a payment did not go through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentFailure {
    pub reason: String,
}

impl PaymentFailure {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for PaymentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Something that can take money from the customer.
///
/// `initiate` is the only suspension point of a checkout. No timeout is
/// applied around it; dropping the returned future abandons the attempt.
///
/// Implementations may be written with `async fn`:
///
/// ```
/// use sleek_shop_core::{PaymentFailure, PaymentProvider, PaymentReference, Price};
///
/// struct AlwaysApprove;
///
/// impl PaymentProvider for AlwaysApprove {
///     async fn initiate(&self, _amount: Price) -> Result<PaymentReference, PaymentFailure> {
///         Ok(PaymentReference::new("OK-1"))
///     }
/// }
/// ```
pub trait PaymentProvider {
    /// Charge `amount` and resolve to a reference or a failure reason.
    fn initiate(
        &self,
        amount: Price,
    ) -> impl Future<Output = Result<PaymentReference, PaymentFailure>> + Send;
}
