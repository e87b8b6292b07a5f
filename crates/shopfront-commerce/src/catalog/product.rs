//! Product and variant snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{resolve_price, PriceSource, ResolvedPrice};
use crate::ids::{CategoryId, ProductId, VariantId};
use crate::CommerceError;

/// A named group of variant values (e.g. "Size": ["M", "L"]).
///
/// Used to render "Size: L" style labels next to line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantGroup {
    pub name: String,
    pub values: Vec<String>,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariant {
    pub id: VariantId,
    /// Attribute values in variant-group order.
    #[serde(default)]
    pub values: Vec<String>,
    /// Variant-level pricing; falls back to the product when absent.
    #[serde(default)]
    pub pricing: Option<PriceSource>,
    /// Variant-level stock; falls back to the product when absent.
    #[serde(default)]
    pub stock: Option<u32>,
    #[serde(default)]
    pub image: Option<String>,
}

/// A product as shown on the detail page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    pub pricing: PriceSource,
    pub stock: u32,
    /// Not yet released; sold through the single-slot preorder basket.
    #[serde(default)]
    pub is_pre_order: bool,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub variant_groups: Vec<VariantGroup>,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// Check if this product is sold by variant.
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Find a variant by id.
    pub fn variant(&self, id: &VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Resolve an optional variant id against this product.
    pub fn find_variant(
        &self,
        id: Option<&VariantId>,
    ) -> Result<Option<&ProductVariant>, CommerceError> {
        match id {
            Some(id) => self
                .variant(id)
                .map(Some)
                .ok_or_else(|| CommerceError::VariantNotFound(id.to_string())),
            None => Ok(None),
        }
    }

    /// Pricing for a variant, falling back to the product.
    pub fn price_source<'a>(&'a self, variant: Option<&'a ProductVariant>) -> &'a PriceSource {
        variant
            .and_then(|v| v.pricing.as_ref())
            .unwrap_or(&self.pricing)
    }

    /// Stock ceiling for a variant, falling back to the product.
    pub fn stock_for(&self, variant: Option<&ProductVariant>) -> u32 {
        variant.and_then(|v| v.stock).unwrap_or(self.stock)
    }

    /// Image for a variant, falling back to the product.
    pub fn image_for(&self, variant: Option<&ProductVariant>) -> Option<String> {
        variant
            .and_then(|v| v.image.clone())
            .or_else(|| self.image.clone())
    }

    /// Resolve the display price of a variant at `now`.
    pub fn resolve_price(&self, variant: Option<&ProductVariant>, now: DateTime<Utc>) -> ResolvedPrice {
        resolve_price(self.price_source(variant), now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{Currency, Money};

    fn product() -> Product {
        Product {
            id: ProductId::new("tee"),
            name: "Cotton Tee".to_string(),
            image: Some("tee.jpg".to_string()),
            pricing: PriceSource::fixed(Money::from_major(500, Currency::BDT)),
            stock: 10,
            is_pre_order: false,
            category_id: None,
            variant_groups: vec![VariantGroup {
                name: "Size".to_string(),
                values: vec!["M".to_string(), "L".to_string()],
            }],
            variants: vec![
                ProductVariant {
                    id: VariantId::new("tee-m"),
                    values: vec!["M".to_string()],
                    pricing: None,
                    stock: Some(3),
                    image: None,
                },
                ProductVariant {
                    id: VariantId::new("tee-l"),
                    values: vec!["L".to_string()],
                    pricing: Some(PriceSource::fixed(Money::from_major(550, Currency::BDT))),
                    stock: None,
                    image: Some("tee-l.jpg".to_string()),
                },
            ],
        }
    }

    #[test]
    fn test_variant_falls_back_to_product_pricing() {
        let p = product();
        let m = p.variant(&VariantId::new("tee-m"));
        assert_eq!(
            p.price_source(m).selling_price,
            Money::from_major(500, Currency::BDT)
        );
        assert_eq!(p.stock_for(m), 3);
        assert_eq!(p.image_for(m).as_deref(), Some("tee.jpg"));
    }

    #[test]
    fn test_variant_overrides() {
        let p = product();
        let l = p.variant(&VariantId::new("tee-l"));
        assert_eq!(
            p.price_source(l).selling_price,
            Money::from_major(550, Currency::BDT)
        );
        assert_eq!(p.stock_for(l), 10);
        assert_eq!(p.image_for(l).as_deref(), Some("tee-l.jpg"));
    }

    #[test]
    fn test_find_unknown_variant() {
        let p = product();
        let missing = VariantId::new("tee-xl");
        assert!(matches!(
            p.find_variant(Some(&missing)),
            Err(CommerceError::VariantNotFound(_))
        ));
        assert!(p.find_variant(None).unwrap().is_none());
    }
}
