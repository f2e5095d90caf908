//! Session middleware configuration.
//!
//! Sessions hold the cart, the logged-in admin and the community access flag.
//! Production uses the `PostgreSQL` store; tests pass a `MemoryStore`.

use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "sz_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer over `store`.
///
/// The cookie is marked `Secure` when `base_url` is HTTPS.
#[must_use]
pub fn create_session_layer<S: SessionStore + Clone>(
    store: S,
    base_url: &str,
) -> SessionManagerLayer<S> {
    let is_secure = base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
