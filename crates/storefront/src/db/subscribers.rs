//! Subscriber repository for the mailing list and community access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sparktizen_core::{Email, SubscriberId};

use super::RepositoryError;
use crate::models::Subscriber;
use crate::services::auth::SubscriberStore;

/// Internal row type for `PostgreSQL` subscriber queries.
#[derive(Debug, sqlx::FromRow)]
struct SubscriberRow {
    id: String,
    email: String,
    code: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = RepositoryError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: SubscriberId::new(row.id),
            email,
            code: row.code,
            created_at: row.created_at,
        })
    }
}

/// Repository for subscriber database operations.
#[derive(Debug, Clone)]
pub struct PgSubscriberRepository {
    pool: PgPool,
}

impl PgSubscriberRepository {
    /// Create a new subscriber repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriberStore for PgSubscriberRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Subscriber>, RepositoryError> {
        let row: Option<SubscriberRow> = sqlx::query_as(
            r"
            SELECT id, email, code, created_at
            FROM subscribers
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Subscriber::try_from).transpose()
    }

    async fn create(&self, email: &Email, code: &str) -> Result<Subscriber, RepositoryError> {
        let row: SubscriberRow = sqlx::query_as(
            r"
            INSERT INTO subscribers (id, email, code)
            VALUES ($1, $2, $3)
            RETURNING id, email, code, created_at
            ",
        )
        .bind(SubscriberId::generate())
        .bind(email)
        .bind(code)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "subscriber"))?;

        Subscriber::try_from(row)
    }
}
