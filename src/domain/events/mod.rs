//! Domain events
use serde::{Deserialize, Serialize};
use crate::domain::migration::MigrationReport;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogEvent {
    ProductSaved { product_id: String },
    SizesMigrated { product_id: String, migrated_size_ids: Vec<String>, fallback_size_ids: Vec<String> },
}

impl CatalogEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::ProductSaved { .. } => "catalog.product.saved",
            Self::SizesMigrated { .. } => "catalog.product.sizes_migrated",
        }
    }

    pub fn product_id(&self) -> &str {
        match self {
            Self::ProductSaved { product_id } | Self::SizesMigrated { product_id, .. } => product_id,
        }
    }
}

impl From<&MigrationReport> for CatalogEvent {
    fn from(report: &MigrationReport) -> Self {
        Self::SizesMigrated {
            product_id: report.product_id.clone(),
            migrated_size_ids: report.migrated_size_ids.clone(),
            fallback_size_ids: report.fallback_size_ids.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_payload() {
        let report = MigrationReport { product_id: "lp-1".into(), migrated_size_ids: vec!["s1".into()], fallback_size_ids: vec![] };
        let event = CatalogEvent::from(&report);
        assert_eq!(event.subject(), "catalog.product.sizes_migrated");
        assert_eq!(event.product_id(), "lp-1");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "sizes_migrated");
        assert_eq!(json["migrated_size_ids"][0], "s1");
    }
}
