//! Business logic services and external gateways.
//!
//! # Services
//!
//! - `catalog` - Product catalog gateway and its read-through cache
//! - `auth` - Admin login and community access checks
//! - `mailing_list` - Mailing list sign-up
//! - `mailer` - Access code delivery (`EmailJS`)
//! - `assets` - Product image hosting (Cloudinary)
//! - `memory` - In-memory gateways for tests and local runs

pub mod assets;
pub mod auth;
pub mod catalog;
pub mod mailer;
pub mod mailing_list;
pub mod memory;

pub use assets::{AssetError, AssetGateway, CloudinaryClient, DisabledAssets};
pub use auth::{AdminUserStore, AuthError, AuthService, SubscriberStore};
pub use catalog::{CachedCatalog, CatalogError, CatalogGateway};
pub use mailer::{AccessCodeMailer, EmailJsClient, LogMailer, MailerError};
pub use mailing_list::{MailingList, MailingListError, SubscribeOutcome};
