//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::{CheckoutConfig, StorefrontConfig};
use crate::db::{PgAdminUserRepository, PgProductRepository, PgSubscriberRepository};
use crate::middleware::ClientIpKeyExtractor;
use crate::services::memory::{
    MemoryAdminUsers, MemoryAssets, MemoryCatalog, MemorySubscribers, RecordingMailer,
};
use crate::services::{
    AccessCodeMailer, AdminUserStore, AssetGateway, CachedCatalog, CatalogGateway,
    CloudinaryClient, DisabledAssets, EmailJsClient, LogMailer, MailerError, SubscriberStore,
};

/// The external collaborators the storefront talks to.
#[derive(Clone)]
pub struct Gateways {
    pub catalog: Arc<dyn CatalogGateway>,
    pub admins: Arc<dyn AdminUserStore>,
    pub subscribers: Arc<dyn SubscriberStore>,
    pub assets: Arc<dyn AssetGateway>,
    pub mailer: Arc<dyn AccessCodeMailer>,
}

impl Gateways {
    /// Production gateways: Postgres behind a read cache, plus Cloudinary and
    /// `EmailJS` when they are configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the `EmailJS` HTTP client fails to build.
    pub fn postgres(pool: &PgPool, config: &StorefrontConfig) -> Result<Self, MailerError> {
        let assets: Arc<dyn AssetGateway> = match &config.cloudinary {
            Some(cloudinary) => Arc::new(CloudinaryClient::new(cloudinary)),
            None => {
                tracing::warn!("Cloudinary not configured, image uploads disabled");
                Arc::new(DisabledAssets)
            }
        };
        let mailer: Arc<dyn AccessCodeMailer> = match &config.emailjs {
            Some(emailjs) => Arc::new(EmailJsClient::new(emailjs)?),
            None => {
                tracing::warn!("EmailJS not configured, access codes will only be logged");
                Arc::new(LogMailer)
            }
        };

        Ok(Self {
            catalog: Arc::new(CachedCatalog::new(PgProductRepository::new(pool.clone()))),
            admins: Arc::new(PgAdminUserRepository::new(pool.clone())),
            subscribers: Arc::new(PgSubscriberRepository::new(pool.clone())),
            assets,
            mailer,
        })
    }

    /// In-memory gateways with nothing in them.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            catalog: Arc::new(MemoryCatalog::new()),
            admins: Arc::new(MemoryAdminUsers::new()),
            subscribers: Arc::new(MemorySubscribers::new()),
            assets: Arc::new(MemoryAssets::new()),
            mailer: Arc::new(RecordingMailer::new()),
        }
    }
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the gateways and checkout configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    checkout: CheckoutConfig,
    gateways: Gateways,
    client_ip: ClientIpKeyExtractor,
}

impl AppState {
    /// Create a new application state that keys rate limits on the socket
    /// peer address.
    #[must_use]
    pub fn new(checkout: CheckoutConfig, gateways: Gateways) -> Self {
        Self::with_client_ip(checkout, gateways, ClientIpKeyExtractor::PEER_ADDRESS)
    }

    /// Create a new application state with an explicit client IP source.
    #[must_use]
    pub fn with_client_ip(
        checkout: CheckoutConfig,
        gateways: Gateways,
        client_ip: ClientIpKeyExtractor,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                checkout,
                gateways,
                client_ip,
            }),
        }
    }

    /// How rate limiters identify a client.
    #[must_use]
    pub fn client_ip(&self) -> ClientIpKeyExtractor {
        self.inner.client_ip
    }

    /// Checkout settings: destination number, shipping policy, currency.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutConfig {
        &self.inner.checkout
    }

    /// Product catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn CatalogGateway {
        self.inner.gateways.catalog.as_ref()
    }

    /// Admin accounts.
    #[must_use]
    pub fn admins(&self) -> &dyn AdminUserStore {
        self.inner.gateways.admins.as_ref()
    }

    /// Mailing list subscribers.
    #[must_use]
    pub fn subscribers(&self) -> &dyn SubscriberStore {
        self.inner.gateways.subscribers.as_ref()
    }

    /// Image hosting.
    #[must_use]
    pub fn assets(&self) -> &dyn AssetGateway {
        self.inner.gateways.assets.as_ref()
    }

    /// Access code delivery.
    #[must_use]
    pub fn mailer(&self) -> &dyn AccessCodeMailer {
        self.inner.gateways.mailer.as_ref()
    }
}
