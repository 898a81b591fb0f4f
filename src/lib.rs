//! Laptop Storefront Catalog
//!
//! Product data model and pricing rules for a bilingual (Arabic/English)
//! laptop and hardware storefront.
//!
//! ## Features
//! - Validation of raw product documents into typed products
//! - Unit and line price computation with sizes and addons
//! - Idempotent migration of legacy absolute size prices
//! - Catalog filtering and sorting
//! - JSONB document storage and catalog events over NATS

use thiserror::Error;

pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod service;
pub mod store;

pub use domain::aggregates::{Cart, CartItem, Product, ProductAddon, ProductSize};
pub use domain::filter::{Filter, SortOrder};
pub use domain::migration::{migrate, migrate_document, migrate_with_report, needs_migration, MigrationReport};
pub use domain::pricing::{quote, unit_final_price, PriceQuote, PricingError, Selection};
pub use domain::schema::{validate_product, validate_product_at, ValidationError, ValidationErrorKind};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Product not found")]
    ProductNotFound,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error("Document id `{document}` does not match `{path}`")]
    IdMismatch { path: String, document: String },

    #[error("Storage error: {0}")]
    StorageError(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
