//! The email-delivery seam and notification message composition.
//!
//! Delivery is fire-and-forget at this layer: a failed send is logged by the
//! batch runner and never retried here.

use std::future::Future;

use thiserror::Error;
use tracing::info;

use crate::types::{ConversationId, EmailAddress};

/// A message handed to the email collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: EmailAddress,
    pub subject: String,
    pub body: String,
}

/// A failed send.
#[derive(Debug, Error)]
#[error("send to {recipient} failed: {reason}")]
pub struct SendError {
    pub recipient: EmailAddress,
    pub reason: String,
}

/// The email-delivery collaborator.
pub trait Mailer: Send + Sync {
    fn send(&self, message: &EmailMessage) -> impl Future<Output = Result<(), SendError>> + Send;
}

/// Composes the "statements are waiting" notification for a conversation.
pub fn compose_notification(conversation: ConversationId, remaining: usize) -> (String, String) {
    let subject = if remaining == 1 {
        "A new statement is waiting for you".to_string()
    } else {
        format!("{remaining} statements are waiting for you")
    };
    let body = format!(
        "Participants have added statements since your last visit.\n\
         You have {remaining} left to vote on.\n\n\
         Return to the conversation: https://agora.example/c/{}\n\n\
         You can unsubscribe from these updates on the conversation page.",
        conversation.0
    );
    (subject, body)
}

/// A mailer that logs instead of delivering. Default wiring for local runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, message: &EmailMessage) -> impl Future<Output = Result<(), SendError>> + Send {
        async move {
            info!(to = %message.to, subject = %message.subject, "would send notification email");
            Ok(())
        }
    }
}
