//! Line items and the identity/merge rule.
//!
//! A line item is identified by `(product_id, variant_id)`. A missing
//! variant id is the "simple product" case and only matches another
//! missing variant id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, VariantGroup};
use crate::ids::{ProductId, VariantId};
use crate::money::{Currency, Money};
use crate::CommerceError;

/// Identity of a basket entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineKey {
    pub product_id: ProductId,
    pub variant_id: Option<VariantId>,
}

impl LineKey {
    pub fn new(product_id: ProductId, variant_id: Option<VariantId>) -> Self {
        Self {
            product_id,
            variant_id,
        }
    }

    /// Compare against borrowed parts without cloning.
    pub fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        &self.product_id == product_id && self.variant_id.as_ref() == variant_id
    }
}

/// An entry in the regular cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    /// Product name (denormalized for display).
    pub name: String,
    /// Effective unit price at the last add.
    pub price: Money,
    /// Baseline unit price at the last add.
    pub selling_price: Money,
    #[serde(default)]
    pub offer_price: Option<Money>,
    /// Whether `price` came from an active offer.
    #[serde(default)]
    pub is_within_offer: bool,
    #[serde(default)]
    pub image: Option<String>,
    /// Always within `[1, max_stock]`.
    pub quantity: u32,
    /// Variant stock, or product stock for simple products.
    pub max_stock: u32,
    /// Attribute values in variant-group order.
    #[serde(default)]
    pub variant_values: Vec<String>,
    #[serde(default)]
    pub variant_groups: Option<Vec<VariantGroup>>,
    pub currency: Currency,
}

impl LineItem {
    /// Snapshot a catalog product into a line item, pricing it at `now`.
    pub fn from_catalog(
        product: &Product,
        variant_id: Option<&VariantId>,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, CommerceError> {
        let variant = product.find_variant(variant_id)?;
        let max_stock = product.stock_for(variant);
        if max_stock == 0 {
            return Err(CommerceError::OutOfStock(product.name.clone()));
        }

        let source = product.price_source(variant);
        let resolved = product.resolve_price(variant, now);

        Ok(Self {
            product_id: product.id.clone(),
            variant_id: variant.map(|v| v.id.clone()),
            name: product.name.clone(),
            price: resolved.effective_price,
            selling_price: resolved.selling_price,
            offer_price: source.offer_price,
            is_within_offer: resolved.is_offer_active,
            image: product.image_for(variant),
            quantity: clamp_quantity(i64::from(quantity), max_stock),
            max_stock,
            variant_values: variant.map(|v| v.values.clone()).unwrap_or_default(),
            variant_groups: non_empty_groups(&product.variant_groups),
            currency: resolved.effective_price.currency,
        })
    }

    /// Identity of this item.
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.variant_id.clone())
    }

    /// Check identity against borrowed parts.
    pub fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        &self.product_id == product_id && self.variant_id.as_ref() == variant_id
    }

    /// `price * quantity`, or None on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.price.try_multiply(i64::from(self.quantity))
    }

    /// Human-readable variant description, e.g. "Size: L, Color: Red".
    pub fn variant_label(&self) -> Option<String> {
        render_variant_label(&self.variant_values, self.variant_groups.as_deref())
    }
}

/// The single reserved item in the preorder basket.
///
/// Priced once at add-time; there is no selling/offer split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreorderItem {
    pub product_id: ProductId,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    pub name: String,
    pub price: Money,
    #[serde(default)]
    pub image: Option<String>,
    pub quantity: u32,
    pub max_stock: u32,
    #[serde(default)]
    pub variant_values: Vec<String>,
    #[serde(default)]
    pub variant_groups: Option<Vec<VariantGroup>>,
    pub currency: Currency,
    #[serde(default = "preorder_marker")]
    pub is_pre_order: bool,
}

fn preorder_marker() -> bool {
    true
}

impl PreorderItem {
    /// Snapshot a catalog product into a preorder reservation.
    pub fn from_catalog(
        product: &Product,
        variant_id: Option<&VariantId>,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, CommerceError> {
        let variant = product.find_variant(variant_id)?;
        let max_stock = product.stock_for(variant);
        if max_stock == 0 {
            return Err(CommerceError::OutOfStock(product.name.clone()));
        }

        let resolved = product.resolve_price(variant, now);

        Ok(Self {
            product_id: product.id.clone(),
            variant_id: variant.map(|v| v.id.clone()),
            name: product.name.clone(),
            price: resolved.effective_price,
            image: product.image_for(variant),
            quantity: clamp_quantity(i64::from(quantity), max_stock),
            max_stock,
            variant_values: variant.map(|v| v.values.clone()).unwrap_or_default(),
            variant_groups: non_empty_groups(&product.variant_groups),
            currency: resolved.effective_price.currency,
            is_pre_order: true,
        })
    }

    /// Identity of this item.
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.variant_id.clone())
    }

    /// `price * quantity`, or None on overflow.
    pub fn line_total(&self) -> Option<Money> {
        self.price.try_multiply(i64::from(self.quantity))
    }

    /// Human-readable variant description.
    pub fn variant_label(&self) -> Option<String> {
        render_variant_label(&self.variant_values, self.variant_groups.as_deref())
    }
}

/// What happened when an item was offered to a basket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Matched an existing entry; quantity is the new total.
    Merged { quantity: u32 },
    /// Inserted as a new entry.
    Inserted { quantity: u32 },
    /// Nothing to add: the incoming item has no stock.
    Rejected,
}

/// Apply the merge rule for `incoming` against `items`.
///
/// A match sums quantities capped at the existing stock ceiling and takes
/// the incoming pricing snapshot. Otherwise the item is inserted with its
/// quantity clamped into `[1, max_stock]`. Repeated identical adds converge
/// on the ceiling.
pub fn merge_line_item(items: &mut Vec<LineItem>, incoming: LineItem) -> MergeOutcome {
    if let Some(existing) = items
        .iter_mut()
        .find(|i| i.matches(&incoming.product_id, incoming.variant_id.as_ref()))
    {
        let summed = i64::from(existing.quantity) + i64::from(incoming.quantity);
        existing.quantity = clamp_quantity(summed, existing.max_stock);
        existing.selling_price = incoming.selling_price;
        existing.offer_price = incoming.offer_price;
        existing.is_within_offer = incoming.is_within_offer;
        existing.price = incoming.price;
        return MergeOutcome::Merged {
            quantity: existing.quantity,
        };
    }

    if incoming.max_stock == 0 {
        return MergeOutcome::Rejected;
    }

    let mut item = incoming;
    item.quantity = clamp_quantity(i64::from(item.quantity), item.max_stock);
    let quantity = item.quantity;
    items.push(item);
    MergeOutcome::Inserted { quantity }
}

/// Clamp a requested quantity into `[1, max_stock]`.
///
/// Callers must handle `max_stock == 0` themselves; it yields 0 here.
pub(crate) fn clamp_quantity(requested: i64, max_stock: u32) -> u32 {
    if max_stock == 0 {
        return 0;
    }
    requested.clamp(1, i64::from(max_stock)) as u32
}

fn non_empty_groups(groups: &[VariantGroup]) -> Option<Vec<VariantGroup>> {
    if groups.is_empty() {
        None
    } else {
        Some(groups.to_vec())
    }
}

fn render_variant_label(values: &[String], groups: Option<&[VariantGroup]>) -> Option<String> {
    if values.is_empty() {
        return None;
    }
    match groups {
        Some(groups) if groups.len() == values.len() => Some(
            groups
                .iter()
                .zip(values)
                .map(|(group, value)| format!("{}: {}", group.name, value))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => Some(values.join(" / ")),
    }
}
