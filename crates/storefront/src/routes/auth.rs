//! Authentication route handlers.
//!
//! Admin login and logout, plus the session summary the front end polls to
//! decide what to show.

use axum::{Json, extract::State, http::StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAdmin, clear_identity, has_community_access, set_current_admin};
use crate::models::CurrentAdmin;
use crate::services::AuthService;
use crate::state::AppState;

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

/// Who the session belongs to.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub admin: Option<CurrentAdmin>,
    pub community_member: bool,
}

/// Log an admin in.
#[instrument(skip(state, session, req), fields(email = %req.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<LoginRequest>,
) -> Result<Json<CurrentAdmin>> {
    let auth = AuthService::new(state.admins(), state.subscribers());
    let user = auth
        .login_admin(&req.email, req.password.expose_secret())
        .await?;

    let admin = CurrentAdmin::from(&user);
    set_current_admin(&session, &admin).await?;
    set_sentry_user(&admin.id, Some(admin.email.as_str()));
    tracing::info!(admin_id = %admin.id, "Admin logged in");

    Ok(Json(admin))
}

/// Log out: forget the admin and community access. The cart stays.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<StatusCode> {
    clear_identity(&session).await?;
    clear_sentry_user();
    Ok(StatusCode::NO_CONTENT)
}

/// Current session identity.
#[instrument(skip(session, admin))]
pub async fn current_session(
    session: Session,
    OptionalAdmin(admin): OptionalAdmin,
) -> Result<Json<SessionInfo>> {
    Ok(Json(SessionInfo {
        community_member: has_community_access(&session).await?,
        admin,
    }))
}
