//! The single-slot preorder basket.

use serde::{Deserialize, Serialize};

use crate::cart::line_item::{clamp_quantity, PreorderItem};
use crate::cart::Drawer;
use crate::money::{Currency, Money};
use crate::CommerceError;

/// Holds at most one reserved, pre-release item.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreorderBasket {
    #[serde(default)]
    pub item: Option<PreorderItem>,
    #[serde(default)]
    pub drawer: Drawer,
    #[serde(default)]
    pub discount: Money,
    #[serde(default)]
    pub currency: Currency,
}

impl PreorderBasket {
    pub fn new(currency: Currency) -> Self {
        Self {
            item: None,
            drawer: Drawer::default(),
            discount: Money::zero(currency),
            currency,
        }
    }

    /// Put `item` in the slot, replacing whatever was there.
    ///
    /// Returns the replaced item. An item without stock is refused and the
    /// slot is left as it was.
    pub fn set(&mut self, mut item: PreorderItem) -> Result<Option<PreorderItem>, CommerceError> {
        if item.max_stock == 0 {
            return Err(CommerceError::OutOfStock(item.name));
        }
        item.quantity = clamp_quantity(i64::from(item.quantity), item.max_stock);
        item.is_pre_order = true;
        Ok(self.item.replace(item))
    }

    pub fn clear(&mut self) {
        self.item = None;
    }

    /// Set the held item's quantity, clamped to `[1, max_stock]`.
    ///
    /// Unlike the regular cart this never empties the slot.
    pub fn update_quantity(&mut self, quantity: i64) {
        if let Some(item) = self.item.as_mut() {
            item.quantity = clamp_quantity(quantity, item.max_stock);
        }
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

    pub fn set_discount(&mut self, discount: Money) {
        self.discount = discount;
    }

    /// 1 when an item is held, else 0.
    pub fn item_count(&self) -> u32 {
        u32::from(self.item.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.item.is_none()
    }

    /// `price * quantity` of the held item, else zero.
    pub fn subtotal(&self) -> Result<Money, CommerceError> {
        match &self.item {
            Some(item) => item.line_total().ok_or(CommerceError::Overflow),
            None => Ok(Money::zero(self.currency)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::line_item::fixtures::{preorder, taka};
    use crate::ids::ProductId;

    #[test]
    fn test_set_replaces_outright() {
        let mut basket = PreorderBasket::new(Currency::BDT);
        assert!(basket.set(preorder("a", 1000, 1, 3)).unwrap().is_none());

        let replaced = basket.set(preorder("b", 1500, 2, 3)).unwrap();
        assert_eq!(replaced.unwrap().product_id, ProductId::new("a"));
        assert_eq!(basket.item.as_ref().unwrap().product_id, ProductId::new("b"));
        assert_eq!(basket.item_count(), 1);
    }

    #[test]
    fn test_set_forces_marker_and_clamps() {
        let mut basket = PreorderBasket::new(Currency::BDT);
        let mut item = preorder("a", 1000, 9, 3);
        item.is_pre_order = false;
        basket.set(item).unwrap();

        let held = basket.item.as_ref().unwrap();
        assert!(held.is_pre_order);
        assert_eq!(held.quantity, 3);
    }

    #[test]
    fn test_set_without_stock_keeps_slot() {
        let mut basket = PreorderBasket::new(Currency::BDT);
        basket.set(preorder("a", 1000, 1, 3)).unwrap();
        assert!(basket.set(preorder("b", 1000, 1, 0)).is_err());
        assert_eq!(basket.item.as_ref().unwrap().product_id, ProductId::new("a"));
    }

    #[test]
    fn test_update_quantity_clamps_both_ways() {
        let mut basket = PreorderBasket::new(Currency::BDT);
        basket.set(preorder("a", 1000, 1, 3)).unwrap();

        basket.update_quantity(10);
        assert_eq!(basket.item.as_ref().unwrap().quantity, 3);

        basket.update_quantity(0);
        assert_eq!(basket.item.as_ref().unwrap().quantity, 1);
        assert_eq!(basket.item_count(), 1);
    }

    #[test]
    fn test_subtotal() {
        let mut basket = PreorderBasket::new(Currency::BDT);
        assert_eq!(basket.subtotal().unwrap(), taka(0));

        basket.set(preorder("a", 1200, 2, 3)).unwrap();
        assert_eq!(basket.subtotal().unwrap(), taka(2400));

        basket.clear();
        assert_eq!(basket.item_count(), 0);
    }
}
