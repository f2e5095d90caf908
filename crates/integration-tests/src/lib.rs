//! Integration tests for Sparktizen.
//!
//! Each test starts the storefront router on an ephemeral local port with
//! in-memory gateways and a memory session store, then drives it over HTTP
//! with a cookie-holding `reqwest` client, the way a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p sparktizen-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tokio::net::TcpListener;
use tower_sessions::MemoryStore;

use sparktizen_core::ProductId;
use sparktizen_storefront::config::CheckoutConfig;
use sparktizen_storefront::middleware::{ClientIpKeyExtractor, create_session_layer};
use sparktizen_storefront::services::AuthService;
use sparktizen_storefront::services::memory::{
    MemoryAdminUsers, MemoryAssets, MemoryCatalog, MemorySubscribers, RecordingMailer,
};
use sparktizen_storefront::state::{AppState, Gateways};

/// Store WhatsApp number used by every test server.
pub const STORE_NUMBER: &str = "2348012345678";

/// Seeded admin credentials.
pub const ADMIN_EMAIL: &str = "owner@sparktizen.test";
pub const ADMIN_PASSWORD: &str = "correct horse battery";

/// A running storefront plus typed handles on its in-memory gateways.
pub struct TestContext {
    pub base_url: String,
    pub subscribers: Arc<MemorySubscribers>,
    pub mailer: Arc<RecordingMailer>,
    pub assets: Arc<MemoryAssets>,
}

impl TestContext {
    /// Start a server with an empty catalog and one admin account.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot bind or the admin cannot be seeded.
    pub async fn start() -> Self {
        Self::start_with(ClientIpKeyExtractor::PEER_ADDRESS).await
    }

    /// Like [`TestContext::start`], keying rate limits with `client_ip`.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot bind or the admin cannot be seeded.
    pub async fn start_with(client_ip: ClientIpKeyExtractor) -> Self {
        let admins = Arc::new(MemoryAdminUsers::new());
        let subscribers = Arc::new(MemorySubscribers::new());
        let mailer = Arc::new(RecordingMailer::new());
        let assets = Arc::new(MemoryAssets::new());

        AuthService::new(admins.as_ref(), subscribers.as_ref())
            .create_admin(ADMIN_EMAIL, "Owner", ADMIN_PASSWORD)
            .await
            .expect("seed admin");

        let gateways = Gateways {
            catalog: Arc::new(MemoryCatalog::new()),
            admins,
            subscribers: subscribers.clone(),
            assets: assets.clone(),
            mailer: mailer.clone(),
        };
        let state = AppState::with_client_ip(CheckoutConfig::new(STORE_NUMBER), gateways, client_ip);
        let session_layer = create_session_layer(MemoryStore::default(), "http://localhost");
        let app = sparktizen_storefront::app(state, session_layer);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .ok();
        });

        Self {
            base_url: format!("http://{addr}"),
            subscribers,
            mailer,
            assets,
        }
    }

    /// A new visitor: fresh cookie jar, fresh session.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn visitor(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Absolute URL for `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// A visitor already logged in as the seeded admin.
    ///
    /// # Panics
    ///
    /// Panics if the login request fails.
    pub async fn admin(&self) -> Client {
        let client = self.visitor();
        let resp = client
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .expect("login request");
        assert!(resp.status().is_success(), "admin login failed: {}", resp.status());
        client
    }

    /// Create a product through the admin API with one small image.
    ///
    /// # Panics
    ///
    /// Panics if the create request fails.
    pub async fn create_product(&self, admin: &Client, name: &str, price: &str) -> ProductId {
        let image = reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4e, 0x47])
            .file_name(format!("{name}.png"))
            .mime_str("image/png")
            .expect("mime");
        let form = reqwest::multipart::Form::new()
            .text("name", name.to_owned())
            .text("description", format!("{name} description"))
            .text("price", price.to_owned())
            .text("in_stock", "true")
            .part("images", image);

        let resp = admin
            .post(self.url("/admin/products"))
            .multipart(form)
            .send()
            .await
            .expect("create product request");
        assert_eq!(resp.status(), reqwest::StatusCode::CREATED);

        let body: Value = resp.json().await.expect("create product body");
        ProductId::new(body["id"].as_str().expect("product id").to_owned())
    }
}
