//! Admin user domain types.

use chrono::{DateTime, Utc};

use sparktizen_core::{AdminUserId, Email};

/// An admin panel account (domain type).
///
/// The password hash is kept out of this type; it is only read by the
/// credential check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
