//! Admin user repository for database operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sparktizen_core::{AdminUserId, Email};

use super::RepositoryError;
use crate::models::AdminUser;
use crate::services::auth::AdminUserStore;

/// Internal row type for `PostgreSQL` admin user queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: String,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: AdminUserId::new(row.id),
            email,
            name: row.name,
            created_at: row.created_at,
        })
    }
}

/// Repository for admin user database operations.
#[derive(Debug, Clone)]
pub struct PgAdminUserRepository {
    pool: PgPool,
}

impl PgAdminUserRepository {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminUserStore for PgAdminUserRepository {
    async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError> {
        let row: AdminUserRow = sqlx::query_as(
            r"
            INSERT INTO admin_users (id, email, name, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, created_at
            ",
        )
        .bind(AdminUserId::generate())
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "admin user"))?;

        AdminUser::try_from(row)
    }

    async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError> {
        let row: Option<(String, String, String, DateTime<Utc>, String)> = sqlx::query_as(
            r"
            SELECT id, email, name, created_at, password_hash
            FROM admin_users
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, email, name, created_at, password_hash)| {
            let user = AdminUser::try_from(AdminUserRow {
                id,
                email,
                name,
                created_at,
            })?;
            Ok((user, password_hash))
        })
        .transpose()
    }
}
