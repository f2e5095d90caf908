//! Authentication service.
//!
//! Two ways in:
//! - Admins log in with email and password (argon2 hashes).
//! - Community members unlock the members area with their mailing list
//!   email and the access code that was mailed to them.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use async_trait::async_trait;
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::instrument;

use sparktizen_core::Email;

use crate::db::RepositoryError;
use crate::models::{AdminUser, Subscriber};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of a community access code.
pub const ACCESS_CODE_LENGTH: usize = 8;

const ACCESS_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

// =============================================================================
// Stores
// =============================================================================

/// Persistence for admin accounts.
#[async_trait]
pub trait AdminUserStore: Send + Sync {
    /// Insert an admin. Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(
        &self,
        email: &Email,
        name: &str,
        password_hash: &str,
    ) -> Result<AdminUser, RepositoryError>;

    /// Look up an admin together with their password hash.
    async fn get_with_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(AdminUser, String)>, RepositoryError>;
}

/// Persistence for mailing list subscribers.
#[async_trait]
pub trait SubscriberStore: Send + Sync {
    /// Look up a subscriber by (normalized) email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Subscriber>, RepositoryError>;

    /// Insert a subscriber. Returns `RepositoryError::Conflict` if the email is taken.
    async fn create(&self, email: &Email, code: &str) -> Result<Subscriber, RepositoryError>;
}

// =============================================================================
// AuthService
// =============================================================================

/// Authentication service.
///
/// Borrowed from [`crate::state::AppState`] per request.
pub struct AuthService<'a> {
    admins: &'a dyn AdminUserStore,
    subscribers: &'a dyn SubscriberStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(admins: &'a dyn AdminUserStore, subscribers: &'a dyn SubscriberStore) -> Self {
        Self {
            admins,
            subscribers,
        }
    }

    /// Create an admin account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn create_admin(
        &self,
        email: &str,
        name: &str,
        password: &str,
    ) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.admins
            .create(&email, name.trim(), &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email or password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login_admin(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (admin, password_hash) = self
            .admins
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(admin)
    }

    /// Check a community member's email and access code.
    ///
    /// The email is matched case-insensitively and the code after trimming
    /// and upper-casing.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if there is no subscriber with
    /// this email or the code does not match.
    #[instrument(skip(self, code))]
    pub async fn verify_community_access(
        &self,
        email: &str,
        code: &str,
    ) -> Result<Subscriber, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let code = normalize_access_code(code);

        let subscriber = self
            .subscribers
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if code.is_empty() || subscriber.code != code {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(subscriber)
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Generate a fresh community access code.
#[must_use]
pub fn generate_access_code() -> String {
    let mut rng = rand::rng();
    (0..ACCESS_CODE_LENGTH)
        .filter_map(|_| ACCESS_CODE_CHARSET.choose(&mut rng).copied().map(char::from))
        .collect()
}

/// Codes are compared trimmed and upper-cased.
#[must_use]
pub fn normalize_access_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if the salt or hash cannot be produced.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::memory::{MemoryAdminUsers, MemorySubscribers};

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_verify_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_access_code_shape() {
        for _ in 0..50 {
            let code = generate_access_code();
            assert_eq!(code.len(), ACCESS_CODE_LENGTH);
            assert!(
                code.chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
            );
        }
    }

    #[tokio::test]
    async fn test_admin_login() {
        let admins = MemoryAdminUsers::new();
        let subscribers = MemorySubscribers::new();
        let auth = AuthService::new(&admins, &subscribers);

        auth.create_admin("Owner@Shop.test", "Owner", "hunter2hunter2")
            .await
            .unwrap();

        let admin = auth
            .login_admin("owner@shop.test", "hunter2hunter2")
            .await
            .unwrap();
        assert_eq!(admin.name, "Owner");

        assert!(matches!(
            auth.login_admin("owner@shop.test", "nope-nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login_admin("stranger@shop.test", "hunter2hunter2").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login_admin("not an email", "hunter2hunter2").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_create_admin_rules() {
        let admins = MemoryAdminUsers::new();
        let subscribers = MemorySubscribers::new();
        let auth = AuthService::new(&admins, &subscribers);

        assert!(matches!(
            auth.create_admin("a@b.test", "A", "short").await,
            Err(AuthError::WeakPassword(_))
        ));
        auth.create_admin("a@b.test", "A", "long-enough").await.unwrap();
        assert!(matches!(
            auth.create_admin("A@B.test", "A", "long-enough").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_community_access() {
        let admins = MemoryAdminUsers::new();
        let subscribers = MemorySubscribers::new();
        let email = Email::parse("member@club.test").unwrap();
        subscribers.create(&email, "AB12CD34").await.unwrap();
        let auth = AuthService::new(&admins, &subscribers);

        let member = auth
            .verify_community_access("MEMBER@club.test", " ab12cd34 ")
            .await
            .unwrap();
        assert_eq!(member.email, email);

        for (email, code) in [
            ("member@club.test", "AB12CD35"),
            ("member@club.test", ""),
            ("other@club.test", "AB12CD34"),
            ("garbage", "AB12CD34"),
        ] {
            assert!(matches!(
                auth.verify_community_access(email, code).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }
}
