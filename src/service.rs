//! Catalog operations behind the HTTP handlers.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::domain::aggregates::Product;
use crate::domain::events::CatalogEvent;
use crate::domain::filter::Filter;
use crate::domain::migration::{migrate_document, MigrationReport};
use crate::domain::pricing::{self, PriceQuote, Selection};
use crate::domain::schema::{validate_product, ValidationError};
use crate::store::ProductStore;
use crate::{CatalogError, Result};

#[derive(Clone)]
pub struct CatalogService {
    store: ProductStore,
    nats: Option<async_nats::Client>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub product_id: String,
    pub quantity: i64,
    pub selected_size: Option<String>,
    #[serde(default)]
    pub selected_addons: Vec<String>,
    pub selected_color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    pub product_id: String,
    pub quantity: i64,
    pub selected_color: Option<String>,
    #[serde(flatten)]
    pub quote: PriceQuote,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BulkMigrationSummary {
    pub scanned: usize,
    pub migrated: Vec<MigrationReport>,
    pub invalid: Vec<InvalidProduct>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InvalidProduct {
    pub id: String,
    pub error: String,
}

impl CatalogService {
    pub fn new(store: ProductStore, nats: Option<async_nats::Client>) -> Self { Self { store, nats } }

    pub async fn list(&self, filter: &Filter) -> Result<Vec<Product>> {
        let (products, _) = self.store.load_all().await?;
        Ok(filter.apply(products))
    }

    pub async fn get(&self, id: &str) -> Result<Product> { self.store.get(id).await }

    /// Validates a raw document and persists it under `id`.
    pub async fn save_document(&self, id: &str, raw: &Value) -> Result<Product> {
        let product = validate_product(raw)?;
        if product.id != id {
            return Err(CatalogError::IdMismatch { path: id.to_string(), document: product.id });
        }
        self.store.upsert(&product).await?;
        self.publish(&CatalogEvent::ProductSaved { product_id: product.id.clone() }).await;
        Ok(product)
    }

    pub async fn migrate_one(&self, id: &str) -> Result<MigrationReport> {
        let raw = self.store.get_document(id).await?;
        let (product, report) = migrated_product(&raw)?;
        self.persist_migration(&product, &report).await?;
        Ok(report)
    }

    /// Migrates every stored document that still has legacy sizes. Documents
    /// that are invalid even after migration are listed and left untouched.
    pub async fn migrate_all(&self) -> Result<BulkMigrationSummary> {
        let documents = self.store.list_documents().await?;
        let mut summary = BulkMigrationSummary { scanned: documents.len(), ..Default::default() };
        for (id, raw) in documents {
            match migrated_product(&raw) {
                Ok((product, report)) => {
                    if report.changed() {
                        self.persist_migration(&product, &report).await?;
                        summary.migrated.push(report);
                    }
                }
                Err(error) => {
                    tracing::warn!(product_id = %id, %error, "product document is invalid after size migration");
                    summary.invalid.push(InvalidProduct { id, error: error.to_string() });
                }
            }
        }
        tracing::info!(
            scanned = summary.scanned,
            migrated = summary.migrated.len(),
            invalid = summary.invalid.len(),
            "bulk size migration finished"
        );
        Ok(summary)
    }

    async fn persist_migration(&self, product: &Product, report: &MigrationReport) -> Result<()> {
        if report.changed() {
            self.store.upsert(product).await?;
            self.publish(&CatalogEvent::from(report)).await;
        }
        Ok(())
    }

    pub async fn quote(&self, req: &QuoteRequest) -> Result<QuoteResponse> {
        let product = self.store.get(&req.product_id).await?;
        let selection = Selection { size_id: req.selected_size.clone(), addon_ids: req.selected_addons.iter().cloned().collect() };
        let quote = pricing::quote_raw(&product, &selection, req.quantity)?;
        if quote.is_negative() {
            tracing::warn!(product_id = %product.id, unit_final_price = %quote.unit_final_price, "quote resolved to a negative unit price");
        }
        Ok(QuoteResponse { product_id: product.id, quantity: req.quantity, selected_color: req.selected_color.clone(), quote })
    }

    /// Publishing is best effort; a broker outage never fails a catalog write.
    async fn publish(&self, event: &CatalogEvent) {
        let Some(nats) = &self.nats else { return };
        let payload = match serde_json::to_vec(event) {
            Ok(p) => p,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode catalog event");
                return;
            }
        };
        if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
            tracing::warn!(subject = event.subject(), product_id = event.product_id(), error = %e, "failed to publish catalog event");
        }
    }
}

/// Size migration runs on the raw document so legacy sizes with unreadable
/// prices are repaired before the schema sees them.
fn migrated_product(raw: &Value) -> std::result::Result<(Product, MigrationReport), ValidationError> {
    let (document, report) = migrate_document(raw);
    Ok((validate_product(&document)?, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_quote_request_defaults() {
        let req: QuoteRequest = serde_json::from_str(r#"{"product_id":"lp-1","quantity":2}"#).unwrap();
        assert!(req.selected_addons.is_empty());
        assert_eq!(req.selected_size, None);
    }

    #[test]
    fn test_quote_response_is_flat() {
        let resp = QuoteResponse {
            product_id: "lp-1".into(),
            quantity: 2,
            selected_color: None,
            quote: PriceQuote { unit_final_price: Decimal::new(110, 0), total_price: Decimal::new(220, 0) },
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["unit_final_price"], 110.0);
        assert_eq!(json["total_price"], 220.0);
    }

    #[test]
    fn test_legacy_document_with_string_size_price_is_migrated() {
        let raw = serde_json::json!({
            "id": "lp-7", "name": "Acer Nitro 5", "brand": "Acer", "price": 300,
            "category": "gaming", "color": "black", "size": "15.6", "images": [],
            "description": "", "isArchived": false,
            "sizes": [{ "id": "s1", "label": "16GB", "price": "300" }]
        });
        let (product, report) = migrated_product(&raw).unwrap();
        assert!(report.changed());
        assert_eq!(report.fallback_size_ids, vec!["s1".to_string()]);
        assert_eq!(product.sizes[0].price, Some(Decimal::new(300, 0)));
        assert_eq!(product.sizes[0].extra_price, Some(Decimal::ZERO));
    }

    #[test]
    fn test_document_invalid_outside_sizes_stays_invalid() {
        let raw = serde_json::json!({ "id": "lp-8", "name": "Broken", "price": 300, "sizes": [] });
        assert!(migrated_product(&raw).is_err());
    }
}
