//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! sz-cli admin create -e admin@example.com -n "Admin Name" -p "long-password"
//! ```
//!
//! The password may also come from `SZ_ADMIN_PASSWORD` to keep it out of
//! shell history.

use thiserror::Error;

use sparktizen_core::AdminUserId;
use sparktizen_storefront::db::{PgAdminUserRepository, PgSubscriberRepository, create_pool};
use sparktizen_storefront::services::{AuthError, AuthService};

use super::{MissingDatabaseUrl, database_url};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    MissingDatabaseUrl(#[from] MissingDatabaseUrl),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation, hashing or insert failed.
    #[error("{0}")]
    Auth(#[from] AuthError),
}

/// Create a new admin user.
///
/// # Returns
///
/// The ID of the created admin user.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<AdminUserId, AdminError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = create_pool(&database_url).await?;

    let admins = PgAdminUserRepository::new(pool.clone());
    let subscribers = PgSubscriberRepository::new(pool);
    let user = AuthService::new(&admins, &subscribers)
        .create_admin(email, name, password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );

    Ok(user.id)
}
