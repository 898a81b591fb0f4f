//! Unit and line price computation for a configured product.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::{Quantity, QuantityError};

/// Options a shopper picked for one product.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub size_id: Option<String>,
    #[serde(default)]
    pub addon_ids: BTreeSet<String>,
}

impl Selection {
    pub fn with_size(mut self, size_id: impl Into<String>) -> Self { self.size_id = Some(size_id.into()); self }
    pub fn with_addon(mut self, addon_id: impl Into<String>) -> Self { self.addon_ids.insert(addon_id.into()); self }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub unit_final_price: Decimal,
    pub total_price: Decimal,
}

impl PriceQuote {
    /// Large negative addon deltas can push the price below zero; that is not clamped here.
    pub fn is_negative(&self) -> bool { self.unit_final_price < Decimal::ZERO }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    #[error(transparent)]
    Quantity(#[from] QuantityError),
    #[error("product {product_id} has no size `{size_id}`")]
    UnknownSize { product_id: String, size_id: String },
    #[error("product {product_id} has no addon `{addon_id}`")]
    UnknownAddon { product_id: String, addon_id: String },
    #[error("price of product {product_id} is out of range")]
    Overflow { product_id: String },
}

/// Price of one unit: the selected size's price (or the base price) plus
/// every selected addon's delta.
pub fn unit_final_price(product: &Product, selection: &Selection) -> Result<Decimal, PricingError> {
    let base = match selection.size_id.as_deref() {
        Some(size_id) if !product.sizes.is_empty() => product
            .size(size_id)
            .ok_or_else(|| PricingError::UnknownSize { product_id: product.id.clone(), size_id: size_id.to_string() })?
            .resolved_price(product.price)
            .ok_or_else(|| overflow(product))?,
        _ => product.price,
    };
    selection.addon_ids.iter().try_fold(base, |acc, addon_id| {
        let addon = product
            .addon(addon_id)
            .ok_or_else(|| PricingError::UnknownAddon { product_id: product.id.clone(), addon_id: addon_id.clone() })?;
        acc.checked_add(addon.price_delta).ok_or_else(|| overflow(product))
    })
}

pub fn quote(product: &Product, selection: &Selection, quantity: Quantity) -> Result<PriceQuote, PricingError> {
    let unit_final_price = unit_final_price(product, selection)?;
    let total_price = line_total(product, unit_final_price, quantity)?;
    Ok(PriceQuote { unit_final_price, total_price })
}

pub(crate) fn line_total(product: &Product, unit_price: Decimal, quantity: Quantity) -> Result<Decimal, PricingError> {
    unit_price.checked_mul(quantity.as_decimal()).ok_or_else(|| overflow(product))
}

fn overflow(product: &Product) -> PricingError { PricingError::Overflow { product_id: product.id.clone() } }

/// Same as [`quote`] for a raw quantity coming from a caller.
pub fn quote_raw(product: &Product, selection: &Selection, quantity: i64) -> Result<PriceQuote, PricingError> {
    quote(product, selection, Quantity::new(quantity)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::product::{ProductAddon, ProductSize};

    fn laptop() -> Product {
        let mut p = Product::new("lp-1", "HP Victus 15", Decimal::new(100, 0));
        p.sizes.push(ProductSize { id: "16gb".into(), label: "16GB RAM".into(), price: Some(Decimal::new(120, 0)), extra_price: Some(Decimal::new(20, 0)) });
        p.addons.push(ProductAddon { id: "bag".into(), label: "Bag discount".into(), price_delta: Decimal::new(-10, 0) });
        p.addons.push(ProductAddon { id: "ssd".into(), label: "1TB SSD".into(), price_delta: Decimal::new(45, 0) });
        p
    }

    #[test]
    fn test_size_and_negative_addon() {
        let sel = Selection::default().with_size("16gb").with_addon("bag");
        let q = quote_raw(&laptop(), &sel, 2).unwrap();
        assert_eq!(q.unit_final_price, Decimal::new(110, 0));
        assert_eq!(q.total_price, Decimal::new(220, 0));
    }

    #[test]
    fn test_base_price_only() {
        let p = Product::new("lp-2", "MacBook Air", Decimal::new(500, 0));
        let q = quote_raw(&p, &Selection::default(), 1).unwrap();
        assert_eq!(q.unit_final_price, Decimal::new(500, 0));
        assert_eq!(q.total_price, Decimal::new(500, 0));
    }

    #[test]
    fn test_size_ignored_when_product_has_no_sizes() {
        let p = Product::new("lp-2", "MacBook Air", Decimal::new(500, 0));
        let sel = Selection::default().with_size("anything");
        assert_eq!(unit_final_price(&p, &sel).unwrap(), Decimal::new(500, 0));
    }

    #[test]
    fn test_non_positive_quantity_is_rejected() {
        assert_eq!(quote_raw(&laptop(), &Selection::default(), 0), Err(PricingError::Quantity(QuantityError::NotPositive(0))));
        assert!(quote_raw(&laptop(), &Selection::default(), -1).is_err());
    }

    #[test]
    fn test_unknown_options_are_rejected() {
        let sel = Selection::default().with_size("64gb");
        assert!(matches!(unit_final_price(&laptop(), &sel), Err(PricingError::UnknownSize { .. })));
        let sel = Selection::default().with_addon("mouse");
        assert!(matches!(unit_final_price(&laptop(), &sel), Err(PricingError::UnknownAddon { .. })));
    }

    #[test]
    fn test_overflow_is_an_error() {
        let p = Product::new("lp-3", "Workstation", Decimal::from_scientific("1e20").unwrap());
        let err = quote_raw(&p, &Selection::default(), 1_000_000_000).unwrap_err();
        assert_eq!(err, PricingError::Overflow { product_id: "lp-3".into() });

        let mut p = Product::new("lp-4", "Workstation", Decimal::MAX);
        p.addons.push(ProductAddon { id: "dock".into(), label: "Dock".into(), price_delta: Decimal::ONE });
        let sel = Selection::default().with_addon("dock");
        assert!(matches!(unit_final_price(&p, &sel), Err(PricingError::Overflow { .. })));
    }

    #[test]
    fn test_negative_unit_price_is_not_clamped() {
        let mut p = laptop();
        p.addons.push(ProductAddon { id: "trade-in".into(), label: "Trade-in".into(), price_delta: Decimal::new(-150, 0) });
        let q = quote_raw(&p, &Selection::default().with_addon("trade-in"), 1).unwrap();
        assert_eq!(q.unit_final_price, Decimal::new(-50, 0));
        assert!(q.is_negative());
    }
}
