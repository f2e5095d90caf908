//! Mailing list sign-up and community access.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::grant_community_access;
use crate::services::{AuthError, AuthService, MailingList};
use crate::state::AppState;

/// Mailing list sign-up request.
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub email: String,
}

/// Community login request.
#[derive(Debug, Deserialize)]
pub struct CommunityLoginRequest {
    pub email: String,
    pub code: String,
}

/// Message for the visitor.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Sign up for the mailing list, or have the code re-sent.
#[instrument(skip(state, req))]
pub async fn subscribe(
    State(state): State<AppState>,
    Json(req): Json<SubscribeRequest>,
) -> Result<Json<MessageResponse>> {
    let outcome = MailingList::new(state.subscribers(), state.mailer())
        .subscribe(&req.email)
        .await?;
    Ok(Json(MessageResponse {
        message: outcome.message(),
    }))
}

/// Grant community access for a matching email and code.
#[instrument(skip(state, session, req))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(req): Json<CommunityLoginRequest>,
) -> Result<Json<MessageResponse>> {
    let auth = AuthService::new(state.admins(), state.subscribers());
    let subscriber = match auth.verify_community_access(&req.email, &req.code).await {
        Ok(subscriber) => subscriber,
        Err(AuthError::InvalidCredentials | AuthError::InvalidEmail(_)) => {
            return Err(AppError::Unauthorized(
                "Invalid credentials. Check your email and code.".to_owned(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    grant_community_access(&session).await?;
    tracing::info!(subscriber_id = %subscriber.id, "Community access granted");

    Ok(Json(MessageResponse {
        message: "Welcome to the community.",
    }))
}
