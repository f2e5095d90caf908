//! Product repository.
//!
//! Rows may carry the legacy single `image_url` column, the `image_urls`
//! list, or both; they are folded into one ordered list here and nowhere
//! else.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use sparktizen_core::{NewProduct, Price, Product, ProductFields, ProductId, ProductImages};

use super::RepositoryError;
use crate::services::catalog::{CatalogError, CatalogGateway};

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image_url, image_urls, in_stock, created_at";

/// Internal row type for `PostgreSQL` product queries.
#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: Decimal,
    image_url: Option<String>,
    image_urls: Option<Vec<String>>,
    in_stock: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price,
            images: ProductImages::from_legacy(row.image_url, row.image_urls),
            in_stock: row.in_stock,
            created_at: row.created_at,
        })
    }
}

/// `PostgreSQL`-backed catalog.
#[derive(Debug, Clone)]
pub struct PgProductRepository {
    pool: PgPool,
}

impl PgProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a fully-formed product, keeping its id and timestamp.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the id already exists.
    pub async fn insert(&self, product: &Product) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO products (id, name, description, price, image_urls, in_stock, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.images.to_urls())
        .bind(product.in_stock)
        .bind(product.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "product"))?;
        Ok(())
    }

    async fn fetch_listing(&self, limit: Option<u32>) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> = match limit {
            Some(n) => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id LIMIT $1"
                ))
                .bind(i64::from(n))
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id"
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(Product::try_from).collect()
    }
}

#[async_trait]
impl CatalogGateway for PgProductRepository {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.fetch_listing(None).await?)
    }

    async fn list_products_limit(&self, limit: u32) -> Result<Vec<Product>, CatalogError> {
        Ok(self.fetch_listing(Some(limit)).await?)
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        Ok(row.map(Product::try_from).transpose()?)
    }

    async fn create_product(&self, product: NewProduct) -> Result<ProductId, CatalogError> {
        let id = ProductId::generate();
        let product = product.into_product(id.clone(), Utc::now());
        self.insert(&product).await?;
        Ok(id)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        fields: ProductFields,
    ) -> Result<(), CatalogError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET name = $2, description = $3, price = $4, in_stock = $5
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.description)
        .bind(fields.price.amount())
        .bind(fields.in_stock)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn health(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(RepositoryError::from)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row() -> ProductRow {
        ProductRow {
            id: "p1".to_owned(),
            name: "Shirt".to_owned(),
            description: "Cotton".to_owned(),
            price: Decimal::from(1000),
            image_url: None,
            image_urls: None,
            in_stock: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_with_legacy_single_image() {
        let product = Product::try_from(ProductRow {
            image_url: Some("https://img.test/a.png".to_owned()),
            ..row()
        })
        .unwrap();
        assert_eq!(product.images.to_urls(), vec!["https://img.test/a.png"]);
    }

    #[test]
    fn test_row_list_wins_over_single() {
        let product = Product::try_from(ProductRow {
            image_url: Some("https://img.test/old.png".to_owned()),
            image_urls: Some(vec![
                "https://img.test/1.png".to_owned(),
                "https://img.test/2.png".to_owned(),
            ]),
            ..row()
        })
        .unwrap();
        assert_eq!(product.images.len(), 2);
        assert_eq!(
            product.images.primary().unwrap().as_str(),
            "https://img.test/1.png"
        );
    }

    #[test]
    fn test_row_negative_price_is_corruption() {
        let err = Product::try_from(ProductRow {
            price: Decimal::from(-5),
            ..row()
        })
        .unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(_)));
    }
}
