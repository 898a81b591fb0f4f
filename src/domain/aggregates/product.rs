//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use validator::Validate;
use crate::domain::value_objects::{Availability, Condition, GpuBrand, ProcessorBrand};

/// A catalog item as stored in the document store, one document per product.
#[derive(Clone, Debug, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub brand: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub color: String,
    /// Free-text size from before structured sizes existed.
    pub size: String,
    pub description: String,
    pub images: Vec<String>,

    #[validate(custom = "non_negative")]
    pub price: Decimal,
    pub special_offer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "percentage")]
    pub discount_percentage: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom = "non_negative")]
    pub discount_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer_ends_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<Availability>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,

    pub is_archived: bool,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,

    pub sizes: Vec<ProductSize>,
    pub addons: Vec<ProductAddon>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub costs: Option<Costs>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processor: Option<Processor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedicated_graphics: Option<DedicatedGraphics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<Display>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wholesale_info: Option<WholesaleInfo>,
}

/// A purchasable size variant. A record without `extraPrice` is in the legacy
/// absolute-price shape and still has to go through size migration.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSize {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_price: Option<Decimal>,
}

impl ProductSize {
    pub fn is_canonical(&self) -> bool { self.extra_price.is_some() }

    /// Price of this size for a product whose base price is `base`, `None` on overflow.
    pub fn resolved_price(&self, base: Decimal) -> Option<Decimal> {
        match self.price {
            Some(price) => Some(price),
            None => base.checked_add(self.extra_price.unwrap_or(Decimal::ZERO)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProductAddon {
    pub id: String,
    pub label: String,
    pub price_delta: Decimal,
}

/// Internal cost data, never shown to buyers.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Costs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_cost: Option<Decimal>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Processor {
    pub processor_name: Option<String>,
    pub processor_brand: Option<ProcessorBrand>,
    pub processor_generation: Option<String>,
    pub cache_memory: Option<f64>,
    pub base_clock_speed: Option<f64>,
    pub max_turbo_speed: Option<f64>,
    pub cores: Option<u32>,
    pub threads: Option<u32>,
    pub integrated_gpu: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DedicatedGraphics {
    pub has_dedicated_graphics: Option<bool>,
    pub dedicated_gpu_brand: Option<GpuBrand>,
    pub dedicated_gpu_model: Option<String>,
    pub vram: Option<u32>,
    pub memory_type: Option<String>,
    pub memory_speed: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Display {
    pub size_inches: Option<f64>,
    pub resolution: Option<String>,
    pub refresh_rate: Option<u32>,
    pub panel_type: Option<String>,
    pub touch_screen: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WholesaleInfo {
    pub supplier_name: Option<String>,
    pub supplier_phone: Option<String>,
    pub supplier_email: Option<String>,
    pub supplier_location: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub purchased_quantity: Option<u32>,
    pub current_quantity: Option<u32>,
    pub notes: Option<String>,
}

impl Product {
    /// Minimal active product with every optional field at its default.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: id.into(), name: name.into(), brand: String::new(), category: String::new(),
            subcategory: None, color: String::new(), size: String::new(), description: String::new(),
            images: vec![], price, special_offer: false, discount_percentage: None, discount_price: None,
            offer_ends_at: None, availability: None, condition: None, is_archived: false,
            created_at: Utc::now().to_rfc3339(), expiration_date: None, sizes: vec![], addons: vec![],
            costs: None, processor: None, dedicated_graphics: None, display: None, wholesale_info: None,
        }
    }

    pub fn size(&self, size_id: &str) -> Option<&ProductSize> { self.sizes.iter().find(|s| s.id == size_id) }
    pub fn addon(&self, addon_id: &str) -> Option<&ProductAddon> { self.addons.iter().find(|a| a.id == addon_id) }

    pub fn base_cost(&self) -> Option<Decimal> { self.costs.as_ref().and_then(|c| c.base_cost) }

    /// Gross margin on the base price. Admin-only.
    pub fn margin(&self) -> Option<Decimal> { self.base_cost().map(|cost| self.price - cost) }

    /// A special offer with no end date, or an end date we cannot read, stays active.
    pub fn offer_active(&self, now: DateTime<Utc>) -> bool {
        if !self.special_offer { return false; }
        match self.offer_ends_at.as_deref().map(DateTime::parse_from_rfc3339) {
            Some(Ok(ends)) => ends.with_timezone(&Utc) > now,
            Some(Err(e)) => {
                tracing::debug!(product_id = %self.id, error = %e, "unreadable offerEndsAt, treating offer as open-ended");
                true
            }
            None => true,
        }
    }

    /// Discounted display price while an offer runs.
    pub fn offer_price(&self, now: DateTime<Utc>) -> Option<Decimal> {
        if !self.offer_active(now) { return None; }
        if let Some(price) = self.discount_price { return Some(price); }
        let pct = self.discount_percentage?;
        self.price.checked_mul(Decimal::ONE_HUNDRED - pct).map(|v| v / Decimal::ONE_HUNDRED)
    }

    pub fn processor_brand(&self) -> Option<ProcessorBrand> { self.processor.as_ref().and_then(|p| p.processor_brand) }
    pub fn gpu_brand(&self) -> Option<GpuBrand> { self.dedicated_graphics.as_ref().and_then(|g| g.dedicated_gpu_brand) }
    pub fn display_size(&self) -> Option<f64> { self.display.as_ref().and_then(|d| d.size_inches) }
}

fn non_negative(value: &Decimal) -> Result<(), validator::ValidationError> {
    if *value < Decimal::ZERO {
        return Err(validator::ValidationError::new("must not be negative"));
    }
    Ok(())
}

fn percentage(value: &Decimal) -> Result<(), validator::ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        return Err(validator::ValidationError::new("must be between 0 and 100"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() }

    #[test]
    fn test_product_new_defaults() {
        let p = Product::new("lp-1", "ThinkPad X1", Decimal::new(45000, 0));
        assert!(p.sizes.is_empty());
        assert!(p.addons.is_empty());
        assert!(!p.special_offer);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_negative_price_fails_validation() {
        let p = Product::new("lp-1", "ThinkPad X1", Decimal::new(-1, 0));
        let errors = p.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("price"));
    }

    #[test]
    fn test_offer_price() {
        let mut p = Product::new("lp-1", "ThinkPad X1", Decimal::new(1000, 0));
        p.special_offer = true;
        p.discount_percentage = Some(Decimal::new(15, 0));
        assert_eq!(p.offer_price(now()), Some(Decimal::new(850, 0)));
        p.discount_price = Some(Decimal::new(800, 0));
        assert_eq!(p.offer_price(now()), Some(Decimal::new(800, 0)));
        p.offer_ends_at = Some("2024-05-31T00:00:00Z".into());
        assert_eq!(p.offer_price(now()), None);
        p.offer_ends_at = Some("2024-06-30T00:00:00Z".into());
        assert!(p.offer_active(now()));
    }

    #[test]
    fn test_margin() {
        let mut p = Product::new("lp-1", "ThinkPad X1", Decimal::new(1000, 0));
        assert_eq!(p.margin(), None);
        p.costs = Some(Costs { base_cost: Some(Decimal::new(700, 0)) });
        assert_eq!(p.margin(), Some(Decimal::new(300, 0)));
    }

    #[test]
    fn test_resolved_size_price() {
        let legacy = ProductSize { id: "s".into(), label: "16GB".into(), price: None, extra_price: Some(Decimal::new(20, 0)) };
        assert_eq!(legacy.resolved_price(Decimal::new(100, 0)), Some(Decimal::new(120, 0)));
        assert_eq!(legacy.resolved_price(Decimal::MAX), None);
    }
}
