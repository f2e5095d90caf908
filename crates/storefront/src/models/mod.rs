//! Domain models for storefront.

pub mod admin_user;
pub mod session;
pub mod subscriber;

pub use admin_user::AdminUser;
pub use session::{CurrentAdmin, keys as session_keys};
pub use subscriber::Subscriber;
