//! The regular multi-item cart.

use serde::{Deserialize, Serialize};

use crate::cart::line_item::{clamp_quantity, merge_line_item, LineItem, MergeOutcome};
use crate::cart::Drawer;
use crate::ids::{ProductId, VariantId};
use crate::money::{Currency, Money};
use crate::CommerceError;

/// A shopping cart of immediately-fulfillable items.
///
/// Quantity operations never fail: out-of-range input is clamped, and a
/// quantity of zero or less removes the entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RegularCart {
    /// Items in insertion order.
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub drawer: Drawer,
    /// Promotional discount applied to the whole cart.
    #[serde(default)]
    pub discount_amount: Money,
    #[serde(default)]
    pub currency: Currency,
}

impl RegularCart {
    /// Create an empty cart.
    pub fn new(currency: Currency) -> Self {
        Self {
            items: Vec::new(),
            drawer: Drawer::default(),
            discount_amount: Money::zero(currency),
            currency,
        }
    }

    /// Add an item, merging with a matching entry.
    pub fn add(&mut self, item: LineItem) -> MergeOutcome {
        let outcome = merge_line_item(&mut self.items, item);
        if outcome == MergeOutcome::Rejected {
            tracing::warn!("ignored add for an item with no stock");
        }
        outcome
    }

    /// Remove an item. Returns whether anything was removed.
    pub fn remove(&mut self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        let len_before = self.items.len();
        self.items.retain(|i| !i.matches(product_id, variant_id));
        self.items.len() < len_before
    }

    /// Set an item's quantity.
    ///
    /// `quantity <= 0` removes the item; otherwise it is clamped to the
    /// item's stock ceiling. Returns whether a matching item existed.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        quantity: i64,
    ) -> bool {
        if quantity <= 0 {
            return self.remove(product_id, variant_id);
        }

        match self
            .items
            .iter_mut()
            .find(|i| i.matches(product_id, variant_id))
        {
            Some(item) => {
                item.quantity = clamp_quantity(quantity, item.max_stock);
                true
            }
            None => false,
        }
    }

    /// Clear all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn open(&mut self) {
        self.drawer.open();
    }

    pub fn close(&mut self) {
        self.drawer.close();
    }

    pub fn toggle(&mut self) {
        self.drawer.toggle();
    }

    /// Set the cart-wide promotional discount.
    pub fn set_discount_amount(&mut self, amount: Money) {
        self.discount_amount = amount;
    }

    /// Get an item by identity.
    pub fn get(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> Option<&LineItem> {
        self.items.iter().find(|i| i.matches(product_id, variant_id))
    }

    /// Sum of quantities.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Check if cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price * quantity`.
    pub fn subtotal(&self) -> Result<Money, CommerceError> {
        self.items
            .iter()
            .try_fold(Money::zero(self.currency), |acc, item| {
                if item.price.currency != self.currency {
                    return Err(CommerceError::CurrencyMismatch {
                        expected: self.currency.code().to_string(),
                        got: item.price.currency.code().to_string(),
                    });
                }
                let line = item.line_total().ok_or(CommerceError::Overflow)?;
                acc.try_add(&line).ok_or(CommerceError::Overflow)
            })
    }

    /// Subtotal minus the cart discount.
    pub fn grand_total(&self) -> Result<Money, CommerceError> {
        let subtotal = self.subtotal()?;
        subtotal
            .try_subtract(&self.discount_amount)
            .ok_or_else(|| CommerceError::CurrencyMismatch {
                expected: self.currency.code().to_string(),
                got: self.discount_amount.currency.code().to_string(),
            })
    }
}
