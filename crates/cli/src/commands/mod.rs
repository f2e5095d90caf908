//! CLI subcommands.

pub mod admin;
pub mod migrate;
pub mod products;

use secrecy::SecretString;
use thiserror::Error;

/// Failure to find a database to talk to.
#[derive(Debug, Error)]
#[error("Missing environment variable: STOREFRONT_DATABASE_URL (or DATABASE_URL)")]
pub struct MissingDatabaseUrl;

/// Database URL from `STOREFRONT_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first if present.
pub fn database_url() -> Result<SecretString, MissingDatabaseUrl> {
    dotenvy::dotenv().ok();
    std::env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MissingDatabaseUrl)
}
