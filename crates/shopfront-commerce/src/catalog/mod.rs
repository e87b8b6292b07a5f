//! Catalog module.
//!
//! Contains the product/variant snapshot the storefront receives from the
//! commerce API, and the time-windowed pricing resolver.

mod pricing;
mod product;

pub use pricing::{resolve_price, PriceSource, ResolvedPrice};
pub use product::{Product, ProductVariant, VariantGroup};
