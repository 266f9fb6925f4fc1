//! Order confirmation records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::payment::PaymentReference;
use crate::types::{OrderNumber, Price};

use super::customer::CustomerInfo;

/// What a successful checkout produces, handed once to the confirmation
/// display. Not persisted by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_number: OrderNumber,
    pub customer_info: CustomerInfo,
    /// Cart total at the moment the payment success was observed.
    pub order_total: Price,
    pub payment_reference: PaymentReference,
    /// Lines that were paid for.
    pub lines: Vec<CartLine>,
    pub item_count: u64,
    pub placed_at: DateTime<Utc>,
}
