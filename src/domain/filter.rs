//! Catalog listing filters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use crate::domain::aggregates::product::Product;
use crate::domain::value_objects::{GpuBrand, ProcessorBrand};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

/// Every field is optional; an empty filter matches every non-archived product.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub search: Option<String>,
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub brand: Option<String>,
    pub color: Option<String>,
    pub size: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub processor_brands: Vec<ProcessorBrand>,
    #[serde(default)]
    pub gpu_brands: Vec<GpuBrand>,
    /// Screen diagonals in inches.
    #[serde(default)]
    pub display_sizes: Vec<f64>,
    #[serde(default)]
    pub sort: SortOrder,
    #[serde(default)]
    pub include_archived: bool,
}

fn eq_ignore_case(wanted: &Option<String>, actual: &str) -> bool {
    wanted.as_deref().map_or(true, |w| w.trim().eq_ignore_ascii_case(actual.trim()))
}

impl Filter {
    pub fn matches(&self, product: &Product) -> bool {
        if product.is_archived && !self.include_archived { return false; }
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            let needle = search.to_lowercase();
            let hit = [&product.name, &product.brand, &product.description, &product.category]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
            if !hit { return false; }
        }
        if !eq_ignore_case(&self.category, &product.category) { return false; }
        if self.subcategory.is_some() && !eq_ignore_case(&self.subcategory, product.subcategory.as_deref().unwrap_or("")) {
            return false;
        }
        if !eq_ignore_case(&self.brand, &product.brand) { return false; }
        if !eq_ignore_case(&self.color, &product.color) { return false; }
        if self.size.is_some()
            && !eq_ignore_case(&self.size, &product.size)
            && !product.sizes.iter().any(|s| eq_ignore_case(&self.size, &s.label))
        {
            return false;
        }
        if self.min_price.is_some_and(|min| product.price < min) { return false; }
        if self.max_price.is_some_and(|max| product.price > max) { return false; }
        if !self.processor_brands.is_empty() && !product.processor_brand().is_some_and(|b| self.processor_brands.contains(&b)) {
            return false;
        }
        if !self.gpu_brands.is_empty() && !product.gpu_brand().is_some_and(|b| self.gpu_brands.contains(&b)) {
            return false;
        }
        if !self.display_sizes.is_empty()
            && !product.display_size().is_some_and(|d| self.display_sizes.iter().any(|s| (s - d).abs() < 0.05))
        {
            return false;
        }
        true
    }

    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let mut out: Vec<Product> = products.into_iter().filter(|p| self.matches(p)).collect();
        out.sort_by(|a, b| self.compare(a, b));
        out
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        match self.sort {
            SortOrder::Newest => b.created_at.cmp(&a.created_at),
            SortOrder::PriceAsc => a.price.cmp(&b.price),
            SortOrder::PriceDesc => b.price.cmp(&a.price),
            SortOrder::NameAsc => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        }
    }
}
