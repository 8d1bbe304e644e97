//! Outbound account notifications.
//!
//! Delivery is behind the [`Notifier`] trait. The bundled [`LogNotifier`]
//! writes notifications to the log instead of sending them.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::db::User;
use crate::Result;

/// A message addressed to one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Recipient address.
    pub recipient: String,
    /// Subject line.
    pub subject: String,
    /// Plain text body.
    pub body: String,
}

impl Notification {
    /// The welcome message sent after signup.
    pub fn welcome(user: &User) -> Self {
        let name = user.first_name.as_deref().unwrap_or(&user.username);
        Self {
            recipient: user.email.clone(),
            subject: "Welcome to Tollgate".to_string(),
            body: format!("Hi {name}, your account has been created successfully."),
        }
    }
}

/// Delivers notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one notification.
    async fn send(&self, notification: &Notification) -> Result<()>;
}

/// Notifier that only logs.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<()> {
        info!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "Notification"
        );
        Ok(())
    }
}

/// Send a notification, logging a failure instead of returning it.
pub async fn notify_quietly(notifier: &dyn Notifier, notification: Notification) {
    if let Err(e) = notifier.send(&notification).await {
        warn!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            error = %e,
            "Failed to send notification"
        );
    }
}
