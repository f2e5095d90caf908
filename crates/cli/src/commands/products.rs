//! Catalog import.
//!
//! # Usage
//!
//! ```bash
//! sz-cli products import products.json
//! ```
//!
//! The file is a JSON array of product documents as exported from the old
//! document store:
//!
//! ```json
//! [{ "id": "abc", "name": "Shirt", "description": "Cotton", "price": 2000,
//!    "imageUrls": ["https://..."], "inStock": true,
//!    "createdAt": "2024-05-01T10:00:00Z" }]
//! ```
//!
//! Older documents carry a single `imageUrl` instead of `imageUrls`; both
//! shapes are folded into one image list. Documents whose id already exists
//! are skipped, so an import can be re-run.

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use sparktizen_core::{Price, Product, ProductId, ProductImages};
use sparktizen_storefront::db::{PgProductRepository, RepositoryError, create_pool};

use super::{MissingDatabaseUrl, database_url};

/// Errors that can occur during an import.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    MissingDatabaseUrl(#[from] MissingDatabaseUrl),

    #[error("Failed to read export: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export is not a JSON array of products: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Product #{index} ({name:?}) is invalid: {reason}")]
    InvalidProduct {
        index: usize,
        name: String,
        reason: String,
    },

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// One product document from the export.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyProduct {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    price: Decimal,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    image_urls: Option<Vec<String>>,
    #[serde(default = "in_stock_default")]
    in_stock: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

const fn in_stock_default() -> bool {
    true
}

impl LegacyProduct {
    fn into_product(self, index: usize, now: DateTime<Utc>) -> Result<Product, ImportError> {
        let invalid = |name: &str, reason: String| ImportError::InvalidProduct {
            index,
            name: name.to_owned(),
            reason,
        };

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(invalid(&name, "name is blank".to_owned()));
        }
        let price = Price::new(self.price).map_err(|e| invalid(&name, e.to_string()))?;
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .map_or_else(ProductId::generate, ProductId::new);

        Ok(Product {
            id,
            name,
            description: self.description.trim().to_owned(),
            price,
            images: ProductImages::from_legacy(self.image_url, self.image_urls),
            in_stock: self.in_stock,
            created_at: self.created_at.unwrap_or(now),
        })
    }
}

/// Parse and validate every document before anything is written.
fn parse_export(json: &str, now: DateTime<Utc>) -> Result<Vec<Product>, ImportError> {
    let documents: Vec<LegacyProduct> = serde_json::from_str(json)?;
    documents
        .into_iter()
        .enumerate()
        .map(|(index, doc)| doc.into_product(index, now))
        .collect()
}

/// Import products from `path`.
///
/// # Returns
///
/// The number of products inserted.
pub async fn import(path: &Path) -> Result<usize, ImportError> {
    let json = tokio::fs::read_to_string(path).await?;
    let products = parse_export(&json, Utc::now())?;
    tracing::info!("Parsed {} products from {}", products.len(), path.display());

    let database_url = database_url()?;
    tracing::info!("Connecting to storefront database...");
    let repo = PgProductRepository::new(create_pool(&database_url).await?);

    let mut inserted = 0;
    for product in &products {
        match repo.insert(product).await {
            Ok(()) => inserted += 1,
            Err(RepositoryError::Conflict(_)) => {
                tracing::warn!(product_id = %product.id, "Product already exists, skipping");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        "Import complete: {} inserted, {} skipped",
        inserted,
        products.len() - inserted
    );
    Ok(inserted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        "2025-01-01T00:00:00Z".parse().unwrap()
    }

    #[test]
    fn test_both_image_shapes_are_normalized() {
        let json = r#"[
            {"id": "a", "name": "Shirt", "description": "Cotton", "price": 2000,
             "imageUrls": ["https://img.test/1.png", "https://img.test/2.png"]},
            {"id": "b", "name": "Cap", "description": "Wool", "price": "1500.50",
             "imageUrl": "https://img.test/cap.png", "inStock": false,
             "createdAt": "2024-05-01T10:00:00Z"},
            {"id": "c", "name": "Sock", "description": "", "price": 0}
        ]"#;

        let products = parse_export(json, now()).unwrap();
        assert_eq!(products.len(), 3);

        let shirt = products.first().unwrap();
        assert_eq!(shirt.images.len(), 2);
        assert!(shirt.in_stock);
        assert_eq!(shirt.created_at, now());

        let cap = products.get(1).unwrap();
        assert_eq!(cap.images.to_urls(), vec!["https://img.test/cap.png"]);
        assert!(!cap.in_stock);
        assert_eq!(cap.price.to_string(), "1500.50");
        assert_ne!(cap.created_at, now());

        let sock = products.get(2).unwrap();
        assert!(sock.images.is_empty());
        assert_eq!(sock.price, Price::ZERO);
    }

    #[test]
    fn test_missing_id_is_generated() {
        let products =
            parse_export(r#"[{"name": "Mug", "price": 10}]"#, now()).unwrap();
        assert_eq!(products.first().unwrap().id.as_str().len(), 36);
    }

    #[test]
    fn test_invalid_documents_are_reported_by_index() {
        let err = parse_export(
            r#"[{"name": "Ok", "price": 1}, {"name": "Bad", "price": -1}]"#,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, ImportError::InvalidProduct { index: 1, .. }));

        let err = parse_export(r#"[{"name": "Odd", "price": "1.005"}]"#, now()).unwrap_err();
        assert!(matches!(err, ImportError::InvalidProduct { index: 0, .. }));

        let err = parse_export(r#"[{"name": "  ", "price": 1}]"#, now()).unwrap_err();
        assert!(matches!(err, ImportError::InvalidProduct { index: 0, .. }));
    }

    #[test]
    fn test_not_an_array() {
        assert!(matches!(
            parse_export(r#"{"name": "x"}"#, now()),
            Err(ImportError::Parse(_))
        ));
    }
}
