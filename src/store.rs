//! Product documents in PostgreSQL, one JSONB document per product.

use serde_json::Value;
use sqlx::PgPool;
use crate::domain::aggregates::Product;
use crate::domain::schema::{validate_product, ValidationError};
use crate::{CatalogError, Result};

#[derive(Clone)]
pub struct ProductStore {
    db: PgPool,
}

/// A stored document that did not pass validation.
#[derive(Debug, Clone)]
pub struct InvalidDocument {
    pub id: String,
    pub error: ValidationError,
}

impl ProductStore {
    pub fn new(db: PgPool) -> Self { Self { db } }

    pub async fn list_documents(&self) -> Result<Vec<(String, Value)>> {
        sqlx::query_as::<_, (String, Value)>("SELECT id, document FROM products ORDER BY id")
            .fetch_all(&self.db)
            .await
            .map_err(storage)
    }

    /// Every valid product plus the documents that failed validation.
    pub async fn load_all(&self) -> Result<(Vec<Product>, Vec<InvalidDocument>)> {
        let mut products = Vec::new();
        let mut invalid = Vec::new();
        for (id, doc) in self.list_documents().await? {
            match validate_product(&doc) {
                Ok(p) => products.push(p),
                Err(error) => {
                    tracing::warn!(product_id = %id, %error, "skipping invalid product document");
                    invalid.push(InvalidDocument { id, error });
                }
            }
        }
        Ok((products, invalid))
    }

    /// The stored document as-is, before validation.
    pub async fn get_document(&self, id: &str) -> Result<Value> {
        let row = sqlx::query_as::<_, (Value,)>("SELECT document FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .map_err(storage)?
            .ok_or(CatalogError::ProductNotFound)?;
        Ok(row.0)
    }

    pub async fn get(&self, id: &str) -> Result<Product> {
        Ok(validate_product(&self.get_document(id).await?)?)
    }

    pub async fn upsert(&self, product: &Product) -> Result<()> {
        let document = serde_json::to_value(product).map_err(|e| CatalogError::StorageError(e.to_string()))?;
        sqlx::query(
            "INSERT INTO products (id, document, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (id) DO UPDATE SET document = EXCLUDED.document, updated_at = NOW()",
        )
        .bind(&product.id)
        .bind(&document)
        .execute(&self.db)
        .await
        .map_err(storage)?;
        tracing::debug!(product_id = %product.id, "product document saved");
        Ok(())
    }
}

fn storage(e: sqlx::Error) -> CatalogError { CatalogError::StorageError(e.to_string()) }
