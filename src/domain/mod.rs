//! Catalog domain: product model, validation, pricing and size migration.
pub mod aggregates;
pub mod events;
pub mod filter;
pub mod migration;
pub mod pricing;
pub mod schema;
pub mod value_objects;
