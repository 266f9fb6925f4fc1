//! Shopping cart state.
//!
//! A [`CartState`] holds one line per product and keeps its derived totals in
//! step with the lines after every mutation. Each shopper session constructs
//! and owns its own instance; there is no process-wide cart.
//!
//! # Example
//!
//! ```
//! use sleek_shop_core::{CartState, Price, ProductId};
//!
//! # fn main() -> Result<(), sleek_shop_core::CartError> {
//! let mut cart = CartState::new();
//! let tee = ProductId::parse("tee").unwrap();
//! cart.add_item(tee.clone(), "T-shirt", Price::from_cents(1500).unwrap(), "/img/tee.jpg")?;
//! cart.add_item(tee.clone(), "T-shirt", Price::from_cents(1500).unwrap(), "/img/tee.jpg")?;
//!
//! assert_eq!(cart.len(), 1);
//! assert_eq!(cart.total_item_count(), 2);
//! assert_eq!(cart.total_price().to_string(), "$30.00");
//!
//! cart.update_quantity(&tee, 0)?;
//! assert!(cart.is_empty());
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{Price, ProductId};

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// The change would push a line or the cart total past the largest
    /// representable amount. The cart is left as it was.
    #[error("cart total too large after changing {product_id}")]
    TotalTooLarge { product_id: ProductId },
}

/// One product entry in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub unit_price: Price,
    pub image_ref: String,
    /// Always at least 1 while the line is in a cart.
    pub quantity: u32,
    /// `unit_price × quantity`, kept current by the owning cart.
    pub line_total: Price,
}

/// Read-only copy of a cart at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub lines: Vec<CartLine>,
    pub total_item_count: u64,
    pub total_price: Price,
}

/// In-memory cart with totals recomputed on every mutation.
///
/// Invariants held between calls:
/// - every line has `quantity >= 1`
/// - no two lines share a `product_id`
/// - `total_item_count` and `total_price` equal the sums over `lines`
///
/// Lines keep the order in which products were first added. A mutation
/// that fails leaves lines, totals and revision untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartState {
    lines: Vec<CartLine>,
    total_item_count: u64,
    total_price: Price,
    revision: u64,
}

impl CartState {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of a product.
    ///
    /// Bumps the quantity of an existing line by one, keeping its original
    /// display metadata, or inserts a new line with quantity 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalTooLarge`] if the new line or cart total
    /// cannot be represented.
    pub fn add_item(
        &mut self,
        product_id: ProductId,
        name: impl Into<String>,
        unit_price: Price,
        image_ref: impl Into<String>,
    ) -> Result<(), CartError> {
        let mut lines = self.lines.clone();
        if let Some(line) = lines.iter_mut().find(|line| line.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(1);
            debug!(product_id = %product_id, quantity = line.quantity, "incremented cart line");
        } else {
            debug!(product_id = %product_id, "added cart line");
            lines.push(CartLine {
                product_id: product_id.clone(),
                name: name.into(),
                unit_price,
                image_ref: image_ref.into(),
                quantity: 1,
                line_total: unit_price,
            });
        }
        self.commit(lines, &product_id)
    }

    /// Remove a product's line. Absent products are ignored.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        let Some(index) = self
            .lines
            .iter()
            .position(|line| &line.product_id == product_id)
        else {
            return;
        };
        let removed = self.lines.remove(index);
        self.total_item_count = self
            .total_item_count
            .saturating_sub(u64::from(removed.quantity));
        self.total_price = self.total_price.saturating_sub(removed.line_total);
        self.revision += 1;
        debug!(product_id = %product_id, "removed cart line");
    }

    /// Set the absolute quantity of a line.
    ///
    /// Zero or below removes the line. Products not in the cart are ignored,
    /// so a quantity edit racing a removal never resurrects the line.
    /// Quantities beyond `u32::MAX` saturate.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::TotalTooLarge`] if the new line or cart total
    /// cannot be represented.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        new_quantity: i64,
    ) -> Result<(), CartError> {
        if new_quantity <= 0 {
            self.remove_item(product_id);
            return Ok(());
        }
        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
        let mut lines = self.lines.clone();
        let Some(line) = lines.iter_mut().find(|line| &line.product_id == product_id) else {
            debug!(product_id = %product_id, "quantity update for product not in cart ignored");
            return Ok(());
        };
        if line.quantity == quantity {
            return Ok(());
        }
        line.quantity = quantity;
        self.commit(lines, product_id)
    }

    /// Empty the cart and zero its totals.
    pub fn clear(&mut self) {
        if self.lines.is_empty() {
            return;
        }
        self.lines.clear();
        self.total_item_count = 0;
        self.total_price = Price::ZERO;
        self.revision += 1;
    }

    /// Take a read-only snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            lines: self.lines.clone(),
            total_item_count: self.total_item_count,
            total_price: self.total_price,
        }
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Look up a single line.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product_id == product_id)
    }

    /// `Σ quantity` across all lines.
    #[must_use]
    pub const fn total_item_count(&self) -> u64 {
        self.total_item_count
    }

    /// `Σ unit_price × quantity` across all lines.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        self.total_price
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Counter bumped by every mutation that changed the cart.
    ///
    /// Observers compare revisions to learn that the cart changed without
    /// diffing lines.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Recompute every total over `lines` and install them, or keep the
    /// current state if any amount overflows.
    fn commit(&mut self, mut lines: Vec<CartLine>, changed: &ProductId) -> Result<(), CartError> {
        let mut total_item_count = 0_u64;
        let mut total_price = Price::ZERO;
        for line in &mut lines {
            line.line_total = line
                .unit_price
                .checked_times(line.quantity)
                .ok_or_else(|| Self::too_large(changed))?;
            total_price = total_price
                .checked_add(line.line_total)
                .ok_or_else(|| Self::too_large(changed))?;
            total_item_count = total_item_count.saturating_add(u64::from(line.quantity));
        }

        self.lines = lines;
        self.total_item_count = total_item_count;
        self.total_price = total_price;
        self.revision += 1;
        Ok(())
    }

    fn too_large(product_id: &ProductId) -> CartError {
        warn!(product_id = %product_id, "cart change rejected, total too large");
        CartError::TotalTooLarge {
            product_id: product_id.clone(),
        }
    }
}
