//! In-memory gateways.
//!
//! Used by the test suites and for running the storefront without external
//! services. Listings are newest first, matching the Postgres catalog.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use sparktizen_core::{
    AdminUserId, Email, ImageRef, NewProduct, Product, ProductFields, ProductId, SubscriberId,
};

use super::assets::{AssetError, AssetGateway};
use super::auth::{AdminUserStore, SubscriberStore};
use super::catalog::{CatalogError, CatalogGateway};
use super::mailer::{AccessCodeMailer, MailerError};
use crate::db::RepositoryError;
use crate::models::{AdminUser, Subscriber};

// =============================================================================
// Catalog
// =============================================================================

/// Catalog held in a `Vec`, oldest first.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    products: RwLock<Vec<Product>>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a product as-is, keeping its id and timestamp.
    pub async fn insert(&self, product: Product) {
        let mut products = self.products.write().await;
        match products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => products.push(product),
        }
    }
}

#[async_trait]
impl CatalogGateway for MemoryCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.read().await.iter().rev().cloned().collect())
    }

    async fn list_products_limit(&self, limit: u32) -> Result<Vec<Product>, CatalogError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(self
            .products
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        Ok(self
            .products
            .read()
            .await
            .iter()
            .find(|p| &p.id == id)
            .cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<ProductId, CatalogError> {
        let id = ProductId::generate();
        self.products
            .write()
            .await
            .push(product.into_product(id.clone(), Utc::now()));
        Ok(id)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        fields: ProductFields,
    ) -> Result<(), CatalogError> {
        let mut products = self.products.write().await;
        let product = products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| CatalogError::NotFound(id.clone()))?;
        product.name = fields.name;
        product.description = fields.description;
        product.price = fields.price;
        product.in_stock = fields.in_stock;
        Ok(())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), CatalogError> {
        let mut products = self.products.write().await;
        let before = products.len();
        products.retain(|p| &p.id != id);
        if products.len() == before {
            return Err(CatalogError::NotFound(id.clone()));
        }
        Ok(())
    }

    async fn health(&self) -> Result<(), CatalogError> {
        Ok(())
    }
}

// =============================================================================
// Identity
// =============================================================================

/// Admin accounts with their password hashes.
#[derive(Debug, Default)]
pub struct MemoryAdminUsers {
    users: RwLock<Vec<(AdminUser, String)>>,
}

impl MemoryAdminUsers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminUserStore for MemoryAdminUsers {
    async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError> {
        let mut users = self.users.write().await;
        if users.iter().any(|(u, _)| &u.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let user = AdminUser {
            id: AdminUserId::generate(),
            email: email.clone(),
            name: name.to_owned(),
            created_at: Utc::now(),
        };
        users.push((user.clone(), password_hash.to_owned()));
        Ok(user)
    }

    async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|(u, _)| &u.email == email)
            .cloned())
    }
}

/// Mailing list subscribers.
#[derive(Debug, Default)]
pub struct MemorySubscribers {
    subscribers: RwLock<Vec<Subscriber>>,
}

impl MemorySubscribers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriberStore for MemorySubscribers {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Subscriber>, RepositoryError> {
        Ok(self
            .subscribers
            .read()
            .await
            .iter()
            .find(|s| &s.email == email)
            .cloned())
    }

    async fn create(&self, email: &Email, code: &str) -> Result<Subscriber, RepositoryError> {
        let mut subscribers = self.subscribers.write().await;
        if subscribers.iter().any(|s| &s.email == email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let subscriber = Subscriber {
            id: SubscriberId::generate(),
            email: email.clone(),
            code: code.to_owned(),
            created_at: Utc::now(),
        };
        subscribers.push(subscriber.clone());
        Ok(subscriber)
    }
}

// =============================================================================
// Assets & mail
// =============================================================================

/// Accepts every non-empty upload and hands back a fake public URL.
#[derive(Debug, Default)]
pub struct MemoryAssets {
    uploads: Mutex<Vec<String>>,
}

impl MemoryAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Filenames uploaded so far.
    pub async fn uploads(&self) -> Vec<String> {
        self.uploads.lock().await.clone()
    }
}

#[async_trait]
impl AssetGateway for MemoryAssets {
    async fn upload_image(
        &self,
        filename: &str,
        _content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<ImageRef, AssetError> {
        if bytes.is_empty() {
            return Err(AssetError::EmptyFile(filename.to_owned()));
        }
        let mut uploads = self.uploads.lock().await;
        uploads.push(filename.to_owned());
        Ok(ImageRef::new(format!(
            "https://assets.test/products/{}-{filename}",
            uploads.len()
        )))
    }
}

/// Remembers every access code it was asked to send.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `(recipient, code)` pairs in send order.
    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl AccessCodeMailer for RecordingMailer {
    async fn send_access_code(&self, to: &Email, code: &str) -> Result<(), MailerError> {
        self.sent
            .lock()
            .await
            .push((to.as_str().to_owned(), code.to_owned()));
        Ok(())
    }
}
