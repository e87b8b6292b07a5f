//! The basket as a single tagged union, and the session that drives it.
//!
//! A regular cart and a preorder can never be held together: `Basket` has
//! one variant per kind and collapses back to `Empty` whenever the active
//! store runs dry. Adds go through [`BasketSession::request_add`], which
//! consults the exclusivity gate and holds a blocked add until the user
//! picks a [`Resolution`].
//!
//! Drawer visibility and the store-level discount live on the session so
//! they outlast the basket emptying; the active store mirrors them.

use serde::{Deserialize, Serialize};
use shopfront_cache::Cache;

use crate::cart::gate::{self, AddKind, BasketState, ConflictPrompt, GateDecision, Resolution};
use crate::cart::line_item::{LineItem, MergeOutcome, PreorderItem};
use crate::cart::{Drawer, PreorderBasket, RegularCart};
use crate::ids::{ProductId, VariantId};
use crate::money::{Currency, Money};
use crate::CommerceError;

/// Cache key the basket is persisted under.
pub const BASKET_KEY: &str = "basket";

/// Everything the customer is about to buy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "contents", rename_all = "snake_case")]
pub enum Basket {
    #[default]
    Empty,
    Regular(RegularCart),
    Preorder(PreorderBasket),
}

/// A basket line as checkout and the order-status page see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    #[serde(default)]
    pub variant_label: Option<String>,
}

impl CheckoutLine {
    pub fn line_total(&self) -> Option<Money> {
        self.price.try_multiply(i64::from(self.quantity))
    }
}

impl Basket {
    pub fn state(&self) -> BasketState {
        match self {
            Basket::Empty => BasketState::Empty,
            Basket::Regular(_) => BasketState::RegularOnly,
            Basket::Preorder(_) => BasketState::PreorderOnly,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Basket::Empty)
    }

    pub fn is_preorder(&self) -> bool {
        matches!(self, Basket::Preorder(_))
    }

    pub fn item_count(&self) -> u32 {
        match self {
            Basket::Empty => 0,
            Basket::Regular(cart) => cart.item_count(),
            Basket::Preorder(basket) => basket.item_count(),
        }
    }

    pub fn subtotal(&self, currency: Currency) -> Result<Money, CommerceError> {
        match self {
            Basket::Empty => Ok(Money::zero(currency)),
            Basket::Regular(cart) => cart.subtotal(),
            Basket::Preorder(basket) => basket.subtotal(),
        }
    }

    /// Store-level promotional discount of the active basket.
    pub fn discount(&self, currency: Currency) -> Money {
        match self {
            Basket::Empty => Money::zero(currency),
            Basket::Regular(cart) => cart.discount_amount,
            Basket::Preorder(basket) => basket.discount,
        }
    }

    /// Lines to submit at checkout, in basket order.
    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        match self {
            Basket::Empty => Vec::new(),
            Basket::Regular(cart) => cart
                .items
                .iter()
                .map(|item| CheckoutLine {
                    product_id: item.product_id.clone(),
                    variant_id: item.variant_id.clone(),
                    name: item.name.clone(),
                    price: item.price,
                    quantity: item.quantity,
                    variant_label: item.variant_label(),
                })
                .collect(),
            Basket::Preorder(basket) => basket
                .item
                .iter()
                .map(|item| CheckoutLine {
                    product_id: item.product_id.clone(),
                    variant_id: item.variant_id.clone(),
                    name: item.name.clone(),
                    price: item.price,
                    quantity: item.quantity,
                    variant_label: item.variant_label(),
                })
                .collect(),
        }
    }

    /// Copy session-level drawer and discount into the active store.
    fn mirror(&mut self, drawer: Drawer, discount: Money) {
        match self {
            Basket::Empty => {}
            Basket::Regular(cart) => {
                cart.drawer = drawer;
                cart.discount_amount = discount;
            }
            Basket::Preorder(basket) => {
                basket.drawer = drawer;
                basket.discount = discount;
            }
        }
    }

    /// Fall back to `Empty` when the active store holds nothing.
    fn collapse(&mut self) {
        let drained = match self {
            Basket::Empty => false,
            Basket::Regular(cart) => cart.is_empty(),
            Basket::Preorder(basket) => basket.is_empty(),
        };
        if drained {
            *self = Basket::Empty;
        }
    }
}

/// An add request, carrying the item snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum BasketAdd {
    Regular(LineItem),
    Preorder(PreorderItem),
}

impl BasketAdd {
    pub fn kind(&self) -> AddKind {
        match self {
            BasketAdd::Regular(_) => AddKind::Regular,
            BasketAdd::Preorder(_) => AddKind::Preorder,
        }
    }
}

/// What an add request did.
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// The add went through.
    Applied(MergeOutcome),
    /// The add is held until the prompt is resolved; contents unchanged.
    Blocked(ConflictPrompt),
}

/// What resolving a prompt did.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveOutcome {
    /// The blocking store was cleared and the held add applied.
    Applied(MergeOutcome),
    /// The held add was dropped; navigate to checkout.
    GoToCheckout,
    /// There was no prompt to resolve.
    NothingPending,
}

#[derive(Debug, Clone, PartialEq)]
struct HeldAdd {
    add: BasketAdd,
    prompt: ConflictPrompt,
}

/// Persisted form of a session.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    basket: Basket,
    #[serde(default)]
    drawer: Drawer,
    #[serde(default)]
    discount: Option<Money>,
}

/// Owned basket state for one shopper.
///
/// Built explicitly and passed to whatever needs it; there is no global
/// instance. Persist with [`save`](Self::save) and [`load`](Self::load).
#[derive(Debug, Clone, PartialEq)]
pub struct BasketSession {
    basket: Basket,
    currency: Currency,
    drawer: Drawer,
    discount: Money,
    held: Option<HeldAdd>,
}

impl BasketSession {
    pub fn new(currency: Currency) -> Self {
        Self {
            basket: Basket::Empty,
            currency,
            drawer: Drawer::default(),
            discount: Money::zero(currency),
            held: None,
        }
    }

    /// Wrap an existing basket, adopting its drawer and discount.
    pub fn with_basket(basket: Basket, currency: Currency) -> Self {
        let drawer = match &basket {
            Basket::Empty => Drawer::default(),
            Basket::Regular(cart) => cart.drawer,
            Basket::Preorder(basket) => basket.drawer,
        };
        let discount = basket.discount(currency);
        let mut basket = basket;
        basket.collapse();
        Self {
            basket,
            currency,
            drawer,
            discount,
            held: None,
        }
    }

    /// Restore from a cache, starting empty when nothing was saved.
    pub fn load(cache: &Cache, currency: Currency) -> Result<Self, CommerceError> {
        let stored = cache.get::<StoredSession>(BASKET_KEY)?.unwrap_or_default();
        let mut session = Self::with_basket(stored.basket, currency);
        session.drawer = stored.drawer;
        if let Some(discount) = stored.discount {
            session.discount = discount;
        }
        session.sync();
        Ok(session)
    }

    /// Persist the basket. A held add is not persisted.
    pub fn save(&self, cache: &Cache) -> Result<(), CommerceError> {
        let stored = StoredSession {
            basket: self.basket.clone(),
            drawer: self.drawer,
            discount: Some(self.discount),
        };
        cache.set(BASKET_KEY, &stored)?;
        Ok(())
    }

    pub fn basket(&self) -> &Basket {
        &self.basket
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn state(&self) -> BasketState {
        self.basket.state()
    }

    pub fn is_drawer_open(&self) -> bool {
        self.drawer.is_open
    }

    /// Store-level promotional discount, kept while the basket is empty.
    pub fn discount(&self) -> Money {
        self.discount
    }

    /// The prompt awaiting a decision, if any.
    pub fn pending_prompt(&self) -> Option<&ConflictPrompt> {
        self.held.as_ref().map(|h| &h.prompt)
    }

    /// Try to add an item, consulting the exclusivity gate first.
    ///
    /// A new request replaces any prompt still awaiting a decision.
    pub fn request_add(&mut self, add: BasketAdd) -> Result<AddOutcome, CommerceError> {
        match gate::evaluate(self.state(), add.kind()) {
            GateDecision::Proceed => {
                self.held = None;
                self.apply(add).map(AddOutcome::Applied)
            }
            GateDecision::Conflict(kind) => {
                let prompt = ConflictPrompt::new(kind);
                tracing::debug!(conflict = %kind, "add blocked by basket gate");
                self.held = Some(HeldAdd { add, prompt });
                Ok(AddOutcome::Blocked(prompt))
            }
        }
    }

    /// Apply the user's choice for the held add.
    pub fn resolve(&mut self, resolution: Resolution) -> Result<ResolveOutcome, CommerceError> {
        let Some(held) = self.held.take() else {
            return Ok(ResolveOutcome::NothingPending);
        };

        match resolution {
            Resolution::ClearAndProceed => {
                tracing::debug!(conflict = %held.prompt.kind, "clearing basket for held add");
                let previous = match held.prompt.kind {
                    // a replace keeps the preorder basket and swaps its slot
                    gate::ConflictKind::PreorderReplace => self.basket.clone(),
                    _ => std::mem::take(&mut self.basket),
                };
                match self.apply(held.add) {
                    Ok(outcome) => Ok(ResolveOutcome::Applied(outcome)),
                    Err(e) => {
                        self.basket = previous;
                        Err(e)
                    }
                }
            }
            Resolution::GoToCheckout => Ok(ResolveOutcome::GoToCheckout),
        }
    }

    /// Drop the held add without changing anything.
    pub fn dismiss_prompt(&mut self) {
        self.held = None;
    }

    fn apply(&mut self, add: BasketAdd) -> Result<MergeOutcome, CommerceError> {
        match add {
            BasketAdd::Regular(item) => {
                if self.basket.is_empty() {
                    self.basket = Basket::Regular(RegularCart::new(self.currency));
                }
                let outcome = match &mut self.basket {
                    Basket::Regular(cart) => cart.add(item),
                    Basket::Empty | Basket::Preorder(_) => {
                        return Err(CommerceError::BasketConflict(
                            gate::ConflictKind::PreorderBlocksRegular,
                        ))
                    }
                };
                self.basket.collapse();
                self.sync();
                Ok(outcome)
            }
            BasketAdd::Preorder(item) => {
                if let Basket::Regular(_) = self.basket {
                    return Err(CommerceError::BasketConflict(
                        gate::ConflictKind::RegularBlocksPreorder,
                    ));
                }
                if let Basket::Preorder(basket) = &mut self.basket {
                    basket.set(item)?;
                } else {
                    let mut basket = PreorderBasket::new(self.currency);
                    basket.set(item)?;
                    self.basket = Basket::Preorder(basket);
                }
                let quantity = match &self.basket {
                    Basket::Preorder(basket) => basket.item.as_ref().map_or(0, |i| i.quantity),
                    _ => 0,
                };
                self.sync();
                Ok(MergeOutcome::Inserted { quantity })
            }
        }
    }

    fn sync(&mut self) {
        self.basket.mirror(self.drawer, self.discount);
    }

    /// Set a regular line's quantity; `<= 0` removes it.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
        quantity: i64,
    ) -> bool {
        let changed = match &mut self.basket {
            Basket::Regular(cart) => cart.update_quantity(product_id, variant_id, quantity),
            _ => false,
        };
        self.basket.collapse();
        changed
    }

    /// Remove a regular line.
    pub fn remove(&mut self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        let removed = match &mut self.basket {
            Basket::Regular(cart) => cart.remove(product_id, variant_id),
            _ => false,
        };
        self.basket.collapse();
        removed
    }

    /// Set the preorder quantity, clamped to `[1, max_stock]`.
    pub fn update_preorder_quantity(&mut self, quantity: i64) {
        if let Basket::Preorder(basket) = &mut self.basket {
            basket.update_quantity(quantity);
        }
    }

    /// Set the store-level discount.
    pub fn set_discount(&mut self, discount: Money) {
        self.discount = discount;
        self.sync();
    }

    pub fn open_drawer(&mut self) {
        self.drawer.open();
        self.sync();
    }

    pub fn close_drawer(&mut self) {
        self.drawer.close();
        self.sync();
    }

    pub fn toggle_drawer(&mut self) {
        self.drawer.toggle();
        self.sync();
    }

    /// Empty both kinds of basket and drop any held add.
    ///
    /// Drawer and discount are left as they are.
    pub fn clear_all(&mut self) {
        self.basket = Basket::Empty;
        self.held = None;
    }

    pub fn subtotal(&self) -> Result<Money, CommerceError> {
        self.basket.subtotal(self.currency)
    }

    pub fn checkout_lines(&self) -> Vec<CheckoutLine> {
        self.basket.checkout_lines()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::gate::ConflictKind;
    use crate::cart::line_item::fixtures::{item, preorder, taka};

    fn session() -> BasketSession {
        BasketSession::new(Currency::BDT)
    }

    #[test]
    fn test_regular_add_from_empty() {
        let mut s = session();
        let outcome = s.request_add(BasketAdd::Regular(item("p1", None, 500, 2, 5))).unwrap();
        assert_eq!(outcome, AddOutcome::Applied(MergeOutcome::Inserted { quantity: 2 }));
        assert_eq!(s.state(), BasketState::RegularOnly);
        assert_eq!(s.subtotal().unwrap(), taka(1000));
    }

    #[test]
    fn test_preorder_while_preorder_is_held_until_resolved() {
        let mut s = session();
        s.request_add(BasketAdd::Preorder(preorder("a", 1000, 1, 3))).unwrap();
        let before = s.basket().clone();

        let outcome = s.request_add(BasketAdd::Preorder(preorder("b", 800, 1, 3))).unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Blocked(ConflictPrompt::new(ConflictKind::PreorderReplace))
        );
        assert_eq!(s.basket(), &before);
        assert!(s.pending_prompt().is_some());

        let resolved = s.resolve(Resolution::ClearAndProceed).unwrap();
        assert_eq!(resolved, ResolveOutcome::Applied(MergeOutcome::Inserted { quantity: 1 }));
        match s.basket() {
            Basket::Preorder(p) => {
                assert_eq!(p.item.as_ref().unwrap().product_id, ProductId::new("b"))
            }
            other => panic!("expected preorder, got {other:?}"),
        }
        assert!(s.pending_prompt().is_none());
    }

    #[test]
    fn test_regular_blocked_by_preorder_go_to_checkout() {
        let mut s = session();
        s.request_add(BasketAdd::Preorder(preorder("a", 1000, 1, 3))).unwrap();
        let outcome = s.request_add(BasketAdd::Regular(item("p1", None, 500, 1, 5))).unwrap();
        assert!(matches!(outcome, AddOutcome::Blocked(p) if p.kind == ConflictKind::PreorderBlocksRegular));

        assert_eq!(s.resolve(Resolution::GoToCheckout).unwrap(), ResolveOutcome::GoToCheckout);
        assert_eq!(s.state(), BasketState::PreorderOnly);
        assert_eq!(s.resolve(Resolution::GoToCheckout).unwrap(), ResolveOutcome::NothingPending);
    }

    #[test]
    fn test_preorder_blocked_by_regular_clear_and_proceed() {
        let mut s = session();
        s.request_add(BasketAdd::Regular(item("p1", None, 500, 1, 5))).unwrap();
        let outcome = s.request_add(BasketAdd::Preorder(preorder("a", 1000, 1, 3))).unwrap();
        assert!(matches!(outcome, AddOutcome::Blocked(p) if p.kind == ConflictKind::RegularBlocksPreorder));
        assert_eq!(s.state(), BasketState::RegularOnly);

        s.resolve(Resolution::ClearAndProceed).unwrap();
        assert_eq!(s.state(), BasketState::PreorderOnly);
        assert_eq!(s.checkout_lines().len(), 1);
    }

    #[test]
    fn test_failed_resolution_restores_basket() {
        let mut s = session();
        s.request_add(BasketAdd::Regular(item("p1", None, 500, 1, 5))).unwrap();
        s.request_add(BasketAdd::Preorder(preorder("a", 1000, 1, 0))).unwrap();

        assert!(s.resolve(Resolution::ClearAndProceed).is_err());
        assert_eq!(s.state(), BasketState::RegularOnly);
    }

    #[test]
    fn test_collapses_to_empty() {
        let mut s = session();
        s.request_add(BasketAdd::Regular(item("p1", None, 500, 1, 5))).unwrap();
        s.update_quantity(&ProductId::new("p1"), None, 0);
        assert!(s.basket().is_empty());

        // a regular add with no stock never leaves an empty regular cart behind
        s.request_add(BasketAdd::Regular(item("p2", None, 500, 1, 0))).unwrap();
        assert_eq!(s.state(), BasketState::Empty);
    }

    #[test]
    fn test_checkout_lines_and_clear_all() {
        let mut s = session();
        s.request_add(BasketAdd::Regular(item("p1", Some("v1"), 500, 2, 5))).unwrap();
        s.request_add(BasketAdd::Regular(item("p2", None, 250, 1, 5))).unwrap();

        let lines = s.checkout_lines();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].line_total(), Some(taka(1000)));

        s.clear_all();
        assert!(s.checkout_lines().is_empty());
    }

    #[test]
    fn test_drawer_and_discount_outlast_empty_basket() {
        let mut s = session();
        s.toggle_drawer();
        s.set_discount(taka(100));

        s.request_add(BasketAdd::Regular(item("p1", None, 500, 1, 5))).unwrap();
        assert!(s.is_drawer_open());
        assert_eq!(s.discount(), taka(100));
        match s.basket() {
            Basket::Regular(cart) => {
                assert!(cart.drawer.is_open);
                assert_eq!(cart.discount_amount, taka(100));
            }
            other => panic!("expected regular, got {other:?}"),
        }

        s.remove(&ProductId::new("p1"), None);
        assert!(s.basket().is_empty());
        assert!(s.is_drawer_open());
        assert_eq!(s.discount(), taka(100));

        s.close_drawer();
        assert!(!s.is_drawer_open());
        s.open_drawer();
        assert!(s.is_drawer_open());
    }

    #[test]
    fn test_preorder_replace_keeps_drawer_and_discount() {
        let mut s = session();
        s.request_add(BasketAdd::Preorder(preorder("a", 1000, 1, 3))).unwrap();
        s.set_discount(taka(50));
        s.open_drawer();

        s.request_add(BasketAdd::Preorder(preorder("b", 800, 1, 3))).unwrap();
        s.resolve(Resolution::ClearAndProceed).unwrap();

        match s.basket() {
            Basket::Preorder(p) => {
                assert_eq!(p.item.as_ref().unwrap().product_id, ProductId::new("b"));
                assert!(p.drawer.is_open);
                assert_eq!(p.discount, taka(50));
            }
            other => panic!("expected preorder, got {other:?}"),
        }
    }

    #[test]
    fn test_failed_preorder_replace_keeps_held_item() {
        let mut s = session();
        s.request_add(BasketAdd::Preorder(preorder("a", 1000, 1, 3))).unwrap();
        s.request_add(BasketAdd::Preorder(preorder("b", 800, 1, 0))).unwrap();

        assert!(s.resolve(Resolution::ClearAndProceed).is_err());
        match s.basket() {
            Basket::Preorder(p) => assert_eq!(p.item.as_ref().unwrap().product_id, ProductId::new("a")),
            other => panic!("expected preorder, got {other:?}"),
        }
    }

    #[test]
    fn test_corrupt_saved_session_is_a_storage_error() {
        let cache = Cache::memory();
        cache.set(BASKET_KEY, &"not a session").unwrap();
        assert!(matches!(
            BasketSession::load(&cache, Currency::BDT),
            Err(CommerceError::Storage(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let cache = Cache::memory();
        let mut s = session();
        s.request_add(BasketAdd::Preorder(preorder("a", 1000, 2, 3))).unwrap();
        s.save(&cache).unwrap();

        let restored = BasketSession::load(&cache, Currency::BDT).unwrap();
        assert_eq!(restored.basket(), s.basket());

        let mut empty = session();
        empty.set_discount(taka(30));
        empty.open_drawer();
        empty.save(&cache).unwrap();
        let restored = BasketSession::load(&cache, Currency::BDT).unwrap();
        assert_eq!(restored.discount(), taka(30));
        assert!(restored.is_drawer_open());

        let fresh = BasketSession::load(&Cache::memory(), Currency::BDT).unwrap();
        assert!(fresh.basket().is_empty());
    }
}
