//! Mailing list subscriber.

use chrono::{DateTime, Utc};

use sparktizen_core::{Email, SubscriberId};

/// A mailing list member and the access code that unlocks the community area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: Email,
    /// Eight upper-case alphanumeric characters.
    pub code: String,
    pub created_at: DateTime<Utc>,
}
