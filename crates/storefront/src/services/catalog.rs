//! Product catalog gateway.
//!
//! [`CatalogGateway`] is the seam between route handlers and wherever
//! products live. The production stack is a [`CachedCatalog`] wrapping
//! [`crate::db::PgProductRepository`]; tests use
//! [`crate::services::memory::MemoryCatalog`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use thiserror::Error;
use tracing::{debug, instrument};

use sparktizen_core::{NewProduct, Product, ProductFields, ProductId};

use crate::db::RepositoryError;

/// Number of products shown on the landing gallery.
pub const GALLERY_SIZE: u32 = 7;

/// How many products are fetched when looking for related ones.
const RELATED_FETCH_LIMIT: u32 = 5;

/// How many related products are shown on a detail page.
pub const RELATED_LIMIT: usize = 4;

/// Errors that can occur when talking to the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No product has this id.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// The backing store failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Read and write access to the product catalog.
///
/// Listings are newest first.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    /// Every product.
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError>;

    /// The first `limit` products.
    async fn list_products_limit(&self, limit: u32) -> Result<Vec<Product>, CatalogError>;

    /// One product, or `None` if the id is unknown.
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError>;

    /// Store a new product and return the id the catalog assigned.
    async fn create_product(&self, product: NewProduct) -> Result<ProductId, CatalogError>;

    /// Replace the editable fields of an existing product. Images are kept.
    async fn update_product(&self, id: &ProductId, fields: ProductFields)
    -> Result<(), CatalogError>;

    /// Delete a product.
    async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError>;

    /// Check that the catalog is reachable.
    async fn health(&self) -> Result<(), CatalogError>;
}

/// Products to show next to `current` on its detail page.
///
/// Takes the first few catalog products, drops `current`, and keeps at most
/// [`RELATED_LIMIT`].
///
/// # Errors
///
/// Returns the catalog's error if the listing fails.
pub async fn related_products(
    catalog: &dyn CatalogGateway,
    current: &ProductId,
) -> Result<Vec<Product>, CatalogError> {
    let products = catalog.list_products_limit(RELATED_FETCH_LIMIT).await?;
    Ok(products
        .into_iter()
        .filter(|p| &p.id != current)
        .take(RELATED_LIMIT)
        .collect())
}

// =============================================================================
// CachedCatalog
// =============================================================================

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Product(ProductId),
    Products { limit: Option<u32> },
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Product(Box<Product>),
    Products(Arc<Vec<Product>>),
}

/// Read-through cache in front of another gateway.
///
/// Product detail and listing reads are cached for 5 minutes. Every
/// successful mutation drops the whole cache, so admins see their edits
/// immediately.
pub struct CachedCatalog<G> {
    inner: G,
    cache: Cache<CacheKey, CacheValue>,
}

impl<G: CatalogGateway> CachedCatalog<G> {
    /// Wrap `inner` with a 5-minute TTL cache.
    #[must_use]
    pub fn new(inner: G) -> Self {
        Self::with_ttl(inner, Duration::from_secs(300))
    }

    /// Wrap `inner` with a custom TTL.
    #[must_use]
    pub fn with_ttl(inner: G, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    /// The wrapped gateway.
    pub const fn inner(&self) -> &G {
        &self.inner
    }

    async fn cached_listing(&self, limit: Option<u32>) -> Result<Vec<Product>, CatalogError> {
        let key = CacheKey::Products { limit };
        if let Some(CacheValue::Products(products)) = self.cache.get(&key).await {
            debug!(?limit, "Cache hit for product listing");
            return Ok(products.as_ref().clone());
        }

        let products = match limit {
            Some(n) => self.inner.list_products_limit(n).await?,
            None => self.inner.list_products().await?,
        };
        self.cache
            .insert(key, CacheValue::Products(Arc::new(products.clone())))
            .await;
        Ok(products)
    }
}

#[async_trait]
impl<G: CatalogGateway> CatalogGateway for CachedCatalog<G> {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        self.cached_listing(None).await
    }

    #[instrument(skip(self))]
    async fn list_products_limit(&self, limit: u32) -> Result<Vec<Product>, CatalogError> {
        self.cached_listing(Some(limit)).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let product = self.inner.get_product(id).await?;
        if let Some(ref p) = product {
            self.cache
                .insert(key, CacheValue::Product(Box::new(p.clone())))
                .await;
        }
        Ok(product)
    }

    #[instrument(skip(self, product), fields(name = %product.fields.name))]
    async fn create_product(&self, product: NewProduct) -> Result<ProductId, CatalogError> {
        let id = self.inner.create_product(product).await?;
        self.cache.invalidate_all();
        Ok(id)
    }

    #[instrument(skip(self, changes), fields(product_id = %id))]
    async fn update_product(
        &self,
        id: &ProductId,
        changes: ProductFields,
    ) -> Result<(), CatalogError> {
        self.inner.update_product(id, changes).await?;
        self.cache.invalidate_all();
        Ok(())
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        self.inner.delete_product(id).await?;
        self.cache.invalidate_all();
        Ok(())
    }

    async fn health(&self) -> Result<(), CatalogError> {
        self.inner.health().await
    }
}
