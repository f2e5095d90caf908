//! Authentication middleware and extractors.
//!
//! Provides extractors for requiring admin authentication in route handlers,
//! plus helpers for the session-scoped community access flag.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;

use crate::models::{CurrentAdmin, session_keys};

/// Extractor that requires an admin to be logged in.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when an admin is required but nobody is logged in.
#[derive(Debug)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Authentication required" })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts.extensions.get::<Session>().ok_or(AuthRejection)?;

        let admin: CurrentAdmin = session
            .get(session_keys::CURRENT_ADMIN)
            .await
            .ok()
            .flatten()
            .ok_or(AuthRejection)?;

        Ok(Self(admin))
    }
}

/// Extractor that optionally gets the current admin.
///
/// Unlike `RequireAdmin`, this does not reject the request if nobody is logged in.
pub struct OptionalAdmin(pub Option<CurrentAdmin>);

impl<S> FromRequestParts<S> for OptionalAdmin
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let admin = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(admin))
    }
}

/// Helper to set the current admin in the session.
///
/// The session id is cycled first so a pre-login id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_admin(
    session: &Session,
    admin: &CurrentAdmin,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_ADMIN, admin).await
}

/// Mark the session as having community access.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn grant_community_access(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::COMMUNITY_MEMBER, true).await
}

/// Whether the session has community access.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn has_community_access(session: &Session) -> Result<bool, tower_sessions::session::Error> {
    Ok(session
        .get::<bool>(session_keys::COMMUNITY_MEMBER)
        .await?
        .unwrap_or(false))
}

/// Drop the admin identity and community flag from the session (logout).
///
/// The cart is left alone.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_identity(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
        .await?;
    session.remove::<bool>(session_keys::COMMUNITY_MEMBER).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use sparktizen_core::{AdminUserId, Email};
    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    fn admin() -> CurrentAdmin {
        CurrentAdmin {
            id: AdminUserId::new("admin-1"),
            email: Email::parse("owner@sparktizen.test").unwrap(),
            name: "Owner".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_community_flag_defaults_to_false() {
        let session = session();
        assert!(!has_community_access(&session).await.unwrap());
        grant_community_access(&session).await.unwrap();
        assert!(has_community_access(&session).await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_identity_keeps_cart() {
        let session = session();
        set_current_admin(&session, &admin()).await.unwrap();
        grant_community_access(&session).await.unwrap();
        session
            .insert(session_keys::CART, sparktizen_core::Cart::new())
            .await
            .unwrap();

        clear_identity(&session).await.unwrap();

        assert!(
            session
                .get::<CurrentAdmin>(session_keys::CURRENT_ADMIN)
                .await
                .unwrap()
                .is_none()
        );
        assert!(!has_community_access(&session).await.unwrap());
        assert!(
            session
                .get::<sparktizen_core::Cart>(session_keys::CART)
                .await
                .unwrap()
                .is_some()
        );
    }
}
