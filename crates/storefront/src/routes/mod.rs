//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Catalog reachability
//!
//! # Products
//! GET  /api/gallery            - Landing gallery
//! GET  /api/products           - Product listing
//! GET  /api/products/{id}      - Product detail with related products
//!
//! # Cart (session)
//! GET  /api/cart               - Cart contents and totals
//! GET  /api/cart/count         - Cart badge count
//! POST /api/cart/add           - Add a product
//! POST /api/cart/update        - Change a quantity
//! POST /api/cart/remove        - Remove a line
//! POST /api/cart/clear         - Empty the cart
//!
//! # Checkout
//! POST /api/checkout           - Order message and WhatsApp link
//!
//! # Community
//! POST /api/mailing-list       - Sign up / resend access code
//! POST /api/community/login    - Email + code access
//! GET  /api/session            - Who is this session
//!
//! # Auth
//! POST /auth/login             - Admin login
//! POST /auth/logout            - Logout
//!
//! # Admin (requires admin)
//! GET    /admin/products       - Product list
//! POST   /admin/products       - Create (multipart)
//! GET    /admin/products/{id}  - Product
//! PUT    /admin/products/{id}  - Update fields
//! DELETE /admin/products/{id}  - Delete
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod community;
pub mod health;
pub mod products;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::{ClientIpKeyExtractor, auth_rate_limiter};
use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/count", get(cart::count))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
}

/// Create the public API router.
pub fn api_routes(client_ip: ClientIpKeyExtractor) -> Router<AppState> {
    let rate_limited = Router::new()
        .route("/mailing-list", post(community::subscribe))
        .route("/community/login", post(community::login))
        .route_layer(auth_rate_limiter(client_ip));

    Router::new()
        .route("/gallery", get(products::gallery))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", post(checkout::checkout))
        .route("/session", get(auth::current_session))
        .merge(rate_limited)
}

/// Create the auth routes router.
pub fn auth_routes(client_ip: ClientIpKeyExtractor) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(auth::login).route_layer(auth_rate_limiter(client_ip)),
        )
        .route("/logout", post(auth::logout))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(admin::index).post(admin::create))
        .route(
            "/products/{id}",
            get(admin::show).put(admin::update).delete(admin::delete),
        )
        .layer(DefaultBodyLimit::max(admin::MAX_UPLOAD_BYTES))
}

/// Create all routes for the storefront.
///
/// `client_ip` decides how the login and sign-up limiters key clients.
pub fn routes(client_ip: ClientIpKeyExtractor) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes(client_ip))
        .nest("/auth", auth_routes(client_ip))
        .nest("/admin", admin_routes())
}
