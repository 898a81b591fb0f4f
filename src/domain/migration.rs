//! Size migration from absolute size prices to base-relative extra prices.
//!
//! Legacy size records carry only an absolute `price`. Canonical records carry
//! `extraPrice` (relative to the product's base price) and the resolved `price`,
//! with `price == product.price + extraPrice`. Migration never fails: a legacy
//! record without a usable price falls back to the base price and is listed in
//! the report so the data can be reviewed.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use crate::domain::aggregates::product::{Product, ProductSize};
use crate::domain::schema::decimal_from_number;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub product_id: String,
    /// Sizes rewritten into the canonical shape.
    pub migrated_size_ids: Vec<String>,
    /// Sizes whose price was missing, unreadable or out of range and were given the base price.
    pub fallback_size_ids: Vec<String>,
}

impl MigrationReport {
    pub fn changed(&self) -> bool { !self.migrated_size_ids.is_empty() }

    fn log_fallbacks(&self, base_price: Decimal) {
        for size_id in &self.fallback_size_ids {
            tracing::warn!(product_id = %self.product_id, size_id = %size_id, base_price = %base_price, "legacy size has no usable price, falling back to base price");
        }
    }
}

/// True iff at least one size still lacks an `extraPrice`.
pub fn needs_migration(product: &Product) -> bool {
    product.sizes.iter().any(|s| !s.is_canonical())
}

pub fn migrate(product: &Product) -> Product { migrate_with_report(product).0 }

pub fn migrate_with_report(product: &Product) -> (Product, MigrationReport) {
    let mut report = MigrationReport { product_id: product.id.clone(), ..Default::default() };
    let sizes = product
        .sizes
        .iter()
        .map(|size| {
            if size.is_canonical() { return size.clone(); }
            let (price, extra_price) = resolve_legacy(product.price, size.price, &size.id, &mut report);
            ProductSize { price: Some(price), extra_price: Some(extra_price), ..size.clone() }
        })
        .collect();
    report.log_fallbacks(product.price);
    (Product { sizes, ..product.clone() }, report)
}

/// Migrates the sizes of a raw product document before it is validated, so
/// legacy records with unreadable prices still reach the canonical shape.
/// A size whose `extraPrice` is not a number counts as legacy; a `price` that
/// is not a number falls back to the base price. Documents without a numeric
/// base `price` or a `sizes` array are returned unchanged.
pub fn migrate_document(raw: &Value) -> (Value, MigrationReport) {
    let mut doc = raw.clone();
    let mut report = MigrationReport {
        product_id: raw.get("id").and_then(Value::as_str).unwrap_or_default().to_string(),
        ..Default::default()
    };
    let Some(base_price) = raw.get("price").and_then(Value::as_number).and_then(decimal_from_number) else {
        return (doc, report);
    };
    let Some(sizes) = doc.get_mut("sizes").and_then(Value::as_array_mut) else {
        return (doc, report);
    };
    for (i, size) in sizes.iter_mut().enumerate() {
        let Some(fields) = size.as_object_mut() else { continue };
        if fields.get("extraPrice").is_some_and(Value::is_number) { continue; }
        let size_id = fields.get("id").and_then(Value::as_str).map(str::to_string).unwrap_or_else(|| format!("#{i}"));
        let legacy_price = fields.get("price").and_then(Value::as_number).and_then(decimal_from_number);
        let (price, extra_price) = resolve_legacy(base_price, legacy_price, &size_id, &mut report);
        fields.insert("price".to_string(), json!(price));
        fields.insert("extraPrice".to_string(), json!(extra_price));
    }
    report.log_fallbacks(base_price);
    (doc, report)
}

/// Absolute and extra price for one legacy size; records the size in the report.
fn resolve_legacy(base_price: Decimal, legacy_price: Option<Decimal>, size_id: &str, report: &mut MigrationReport) -> (Decimal, Decimal) {
    report.migrated_size_ids.push(size_id.to_string());
    if let Some(price) = legacy_price {
        if let Some(extra) = price.checked_sub(base_price) {
            return (price, extra);
        }
    }
    report.fallback_size_ids.push(size_id.to_string());
    (base_price, Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(id: &str, price: Option<i64>, extra: Option<i64>) -> ProductSize {
        ProductSize { id: id.into(), label: id.to_uppercase(), price: price.map(Decimal::from), extra_price: extra.map(Decimal::from) }
    }

    fn product(base: i64, sizes: Vec<ProductSize>) -> Product {
        let mut p = Product::new("lp-1", "Lenovo Legion 5", Decimal::from(base));
        p.sizes = sizes;
        p
    }

    #[test]
    fn test_canonical_is_untouched() {
        let p = product(100, vec![size("a", Some(120), Some(20)), size("b", Some(100), Some(0))]);
        assert!(!needs_migration(&p));
        let (migrated, report) = migrate_with_report(&p);
        assert_eq!(migrated, p);
        assert!(!report.changed());
    }

    #[test]
    fn test_legacy_absolute_price() {
        let p = product(100, vec![size("a", Some(150), None), size("b", Some(120), Some(20))]);
        assert!(needs_migration(&p));
        let (migrated, report) = migrate_with_report(&p);
        assert_eq!(migrated.sizes[0].extra_price, Some(Decimal::from(50)));
        assert_eq!(migrated.sizes[0].price, Some(Decimal::from(150)));
        assert_eq!(migrated.sizes[0].label, "A");
        assert_eq!(migrated.sizes[1], p.sizes[1]);
        assert_eq!(report.migrated_size_ids, vec!["a".to_string()]);
        assert!(report.fallback_size_ids.is_empty());
        assert!(!needs_migration(&migrated));
    }

    #[test]
    fn test_missing_price_falls_back_to_base() {
        let p = product(300, vec![size("a", None, None)]);
        let (migrated, report) = migrate_with_report(&p);
        assert_eq!(migrated.sizes[0].extra_price, Some(Decimal::ZERO));
        assert_eq!(migrated.sizes[0].price, Some(Decimal::from(300)));
        assert_eq!(report.fallback_size_ids, vec!["a".to_string()]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let p = product(100, vec![size("a", Some(90), None)]);
        let before = p.clone();
        let _ = migrate(&p);
        assert_eq!(p, before);
    }

    #[test]
    fn test_legacy_below_base_gives_negative_extra() {
        let p = product(100, vec![size("a", Some(90), None)]);
        assert_eq!(migrate(&p).sizes[0].extra_price, Some(Decimal::from(-10)));
    }

    #[test]
    fn test_out_of_range_difference_falls_back() {
        let base = Decimal::from_scientific("5e28").unwrap();
        let mut p = Product::new("lp-1", "Lenovo Legion 5", base);
        p.sizes = vec![ProductSize { id: "a".into(), label: "A".into(), price: Some(-base), extra_price: None }];
        let (migrated, report) = migrate_with_report(&p);
        assert_eq!(migrated.sizes[0].price, Some(base));
        assert_eq!(migrated.sizes[0].extra_price, Some(Decimal::ZERO));
        assert_eq!(report.fallback_size_ids, vec!["a".to_string()]);
    }

    mod document {
        use super::*;
        use crate::domain::schema::validate_product;
        use serde_json::json;

        fn legacy_doc(sizes: Value) -> Value {
            json!({
                "id": "lp-7", "name": "Acer Nitro 5", "brand": "Acer", "price": 300,
                "category": "gaming", "color": "black", "size": "15.6", "images": [],
                "description": "", "isArchived": false, "sizes": sizes
            })
        }

        #[test]
        fn test_string_price_falls_back_and_validates() {
            let raw = legacy_doc(json!([{ "id": "s1", "label": "16GB", "price": "300" }]));
            assert!(validate_product(&raw).is_err());

            let (doc, report) = migrate_document(&raw);
            assert_eq!(report.migrated_size_ids, vec!["s1".to_string()]);
            assert_eq!(report.fallback_size_ids, vec!["s1".to_string()]);
            let p = validate_product(&doc).unwrap();
            assert_eq!(p.sizes[0].price, Some(Decimal::from(300)));
            assert_eq!(p.sizes[0].extra_price, Some(Decimal::ZERO));
            assert!(!needs_migration(&p));
        }

        #[test]
        fn test_non_numeric_extra_price_is_legacy() {
            let raw = legacy_doc(json!([
                { "id": "s1", "label": "32GB", "price": 350, "extraPrice": "fifty", "sku": "NITRO-32" },
                { "id": "s2", "label": "16GB", "price": 300, "extraPrice": 0 }
            ]));
            let (doc, report) = migrate_document(&raw);
            assert_eq!(report.migrated_size_ids, vec!["s1".to_string()]);
            assert!(report.fallback_size_ids.is_empty());
            assert_eq!(doc["sizes"][0]["sku"], "NITRO-32");
            assert_eq!(doc["sizes"][1], raw["sizes"][1]);
            let p = validate_product(&doc).unwrap();
            assert_eq!(p.sizes[0].extra_price, Some(Decimal::from(50)));
        }

        #[test]
        fn test_document_migration_is_idempotent() {
            let raw = legacy_doc(json!([{ "id": "s1", "label": "16GB" }, { "id": "s2", "label": "32GB", "price": 420 }]));
            let (once, _) = migrate_document(&raw);
            let (twice, report) = migrate_document(&once);
            assert_eq!(once, twice);
            assert!(!report.changed());
        }

        #[test]
        fn test_document_without_base_price_is_untouched() {
            let mut raw = legacy_doc(json!([{ "id": "s1", "label": "16GB" }]));
            raw["price"] = json!("cheap");
            let (doc, report) = migrate_document(&raw);
            assert_eq!(doc, raw);
            assert!(!report.changed());
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_size() -> impl Strategy<Value = ProductSize> {
            ("[a-z]{1,6}", proptest::option::of(0i64..100_000), proptest::option::of(-5_000i64..5_000))
                .prop_map(|(id, price, extra)| size(&id, price, extra))
        }

        fn arb_product() -> impl Strategy<Value = Product> {
            (0i64..100_000, proptest::collection::vec(arb_size(), 0..8)).prop_map(|(base, sizes)| product(base, sizes))
        }

        proptest! {
            #[test]
            fn migrate_is_idempotent(p in arb_product()) {
                let once = migrate(&p);
                prop_assert_eq!(migrate(&once), once);
            }

            #[test]
            fn migrated_products_need_no_migration(p in arb_product()) {
                prop_assert!(!needs_migration(&migrate(&p)));
            }

            #[test]
            fn migrated_legacy_sizes_hold_price_invariant(p in arb_product()) {
                let migrated = migrate(&p);
                for (before, after) in p.sizes.iter().zip(&migrated.sizes) {
                    if before.is_canonical() {
                        prop_assert_eq!(before, after);
                    } else {
                        prop_assert_eq!(after.price, after.extra_price.map(|extra| p.price + extra));
                    }
                }
            }
        }
    }
}
