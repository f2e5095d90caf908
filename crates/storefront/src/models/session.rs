//! Session-related types.
//!
//! Types stored in the session: login state and the shopping cart.

use serde::{Deserialize, Serialize};

use sparktizen_core::{AdminUserId, Email};

use super::AdminUser;

/// Session-stored admin identity.
///
/// Minimal data stored in the session to identify the logged-in admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Admin's database ID.
    pub id: AdminUserId,
    /// Admin's email address.
    pub email: Email,
    /// Admin's display name.
    pub name: String,
}

impl From<&AdminUser> for CurrentAdmin {
    fn from(user: &AdminUser) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in admin.
    pub const CURRENT_ADMIN: &str = "current_admin";

    /// Key for the community access flag (`bool`).
    pub const COMMUNITY_MEMBER: &str = "community_member";

    /// Key for the shopping cart (`sparktizen_core::Cart`).
    pub const CART: &str = "cart";
}
