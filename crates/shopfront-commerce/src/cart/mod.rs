//! Baskets.
//!
//! Contains line items and the merge rule, the regular cart, the preorder
//! slot, the exclusivity gate between them, and the basket union tying
//! them together.

mod basket;
mod drawer;
mod gate;
mod line_item;
mod preorder;
mod regular;

pub use basket::{
    AddOutcome, Basket, BasketAdd, BasketSession, CheckoutLine, ResolveOutcome, BASKET_KEY,
};
pub use drawer::Drawer;
pub use gate::{evaluate, AddKind, BasketState, ConflictKind, ConflictPrompt, GateDecision, Resolution};
pub use line_item::{merge_line_item, LineItem, LineKey, MergeOutcome, PreorderItem};
pub use preorder::PreorderBasket;
pub use regular::RegularCart;

#[cfg(test)]
pub(crate) use line_item::fixtures;
