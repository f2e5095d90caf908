//! Mailing list sign-up.
//!
//! Signing up stores the email with a fresh access code and mails the code.
//! Signing up again with a known email re-sends the existing code instead of
//! issuing a new one.

use thiserror::Error;
use tracing::instrument;

use sparktizen_core::{Email, EmailError};

use super::auth::{SubscriberStore, generate_access_code};
use super::mailer::{AccessCodeMailer, MailerError};
use crate::db::RepositoryError;

/// What a sign-up did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscribeOutcome {
    /// New subscriber; a new code was issued and sent.
    Subscribed,
    /// Already subscribed; the existing code was sent again.
    CodeResent,
}

impl SubscribeOutcome {
    /// Message shown to the visitor.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Subscribed => "Check your email for your access code.",
            Self::CodeResent => "Already on the list. Code resent to your inbox.",
        }
    }
}

/// Errors that can occur during sign-up.
#[derive(Debug, Error)]
pub enum MailingListError {
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("mail delivery failed: {0}")]
    Mailer(#[from] MailerError),
}

/// Mailing list operations, borrowed from app state per request.
pub struct MailingList<'a> {
    subscribers: &'a dyn SubscriberStore,
    mailer: &'a dyn AccessCodeMailer,
}

impl<'a> MailingList<'a> {
    #[must_use]
    pub const fn new(subscribers: &'a dyn SubscriberStore, mailer: &'a dyn AccessCodeMailer) -> Self {
        Self {
            subscribers,
            mailer,
        }
    }

    /// Sign `email` up, or re-send the code if it is already on the list.
    ///
    /// # Errors
    ///
    /// Returns `MailingListError::InvalidEmail` for a malformed address, and
    /// the store's or mailer's error if either fails.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, email: &str) -> Result<SubscribeOutcome, MailingListError> {
        let email = Email::parse(email)?;

        if let Some(existing) = self.subscribers.find_by_email(&email).await? {
            self.mailer.send_access_code(&email, &existing.code).await?;
            tracing::info!(email = %email, "Access code re-sent");
            return Ok(SubscribeOutcome::CodeResent);
        }

        let code = generate_access_code();
        let subscriber = match self.subscribers.create(&email, &code).await {
            Ok(subscriber) => subscriber,
            // Lost a race with a concurrent sign-up for the same email.
            Err(RepositoryError::Conflict(_)) => {
                let existing = self
                    .subscribers
                    .find_by_email(&email)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                self.mailer.send_access_code(&email, &existing.code).await?;
                return Ok(SubscribeOutcome::CodeResent);
            }
            Err(e) => return Err(e.into()),
        };

        self.mailer
            .send_access_code(&subscriber.email, &subscriber.code)
            .await?;
        tracing::info!(email = %email, "New mailing list subscriber");
        Ok(SubscribeOutcome::Subscribed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::memory::{MemorySubscribers, RecordingMailer};

    #[tokio::test]
    async fn test_new_subscriber_gets_code() {
        let subscribers = MemorySubscribers::new();
        let mailer = RecordingMailer::new();
        let list = MailingList::new(&subscribers, &mailer);

        let outcome = list.subscribe(" New@Member.test ").await.unwrap();
        assert_eq!(outcome, SubscribeOutcome::Subscribed);

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        let (to, code) = sent.first().unwrap();
        assert_eq!(to, "new@member.test");
        assert_eq!(code.len(), 8);

        let stored = subscribers
            .find_by_email(&Email::parse("new@member.test").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&stored.code, code);
    }

    #[tokio::test]
    async fn test_existing_subscriber_gets_same_code() {
        let subscribers = MemorySubscribers::new();
        let mailer = RecordingMailer::new();
        let list = MailingList::new(&subscribers, &mailer);

        list.subscribe("repeat@member.test").await.unwrap();
        let outcome = list.subscribe("REPEAT@member.test").await.unwrap();
        assert_eq!(outcome, SubscribeOutcome::CodeResent);
        assert_eq!(
            outcome.message(),
            "Already on the list. Code resent to your inbox."
        );

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 2);
        assert_eq!(sent.first().unwrap().1, sent.get(1).unwrap().1);
    }

    #[tokio::test]
    async fn test_invalid_email_rejected() {
        let subscribers = MemorySubscribers::new();
        let mailer = RecordingMailer::new();
        let list = MailingList::new(&subscribers, &mailer);

        assert!(matches!(
            list.subscribe("").await,
            Err(MailingListError::InvalidEmail(_))
        ));
        assert!(mailer.sent().await.is_empty());
    }
}
