use std::fmt;

use chrono::DateTime;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::token::models::IssuedToken;
use crate::domain::user::models::EmailAddress;

/// Kind of message a notification asks to be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTemplate {
    VerifyEmail,
    ResetPassword,
}

impl NotificationTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationTemplate::VerifyEmail => "verify-email",
            NotificationTemplate::ResetPassword => "reset-password",
        }
    }
}

impl fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain event asking for a token to be mailed to a user.
///
/// Delivery is someone else's job; this only carries what the mail needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRequestedEvent {
    pub event_id: String,
    pub recipient: String,
    pub template: NotificationTemplate,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub requested_at: DateTime<Utc>,
}

impl NotificationRequestedEvent {
    /// Create a new notification request for a freshly issued token.
    ///
    /// Generates a unique event ID.
    ///
    /// # Arguments
    /// * `recipient` - Address the mail goes to
    /// * `template` - Which mail to send
    /// * `token` - Token to embed in the mail
    /// * `requested_at` - Time of the request
    ///
    /// # Returns
    /// NotificationRequestedEvent ready for publishing
    pub fn new(
        recipient: &EmailAddress,
        template: NotificationTemplate,
        token: &IssuedToken,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            recipient: recipient.as_str().to_string(),
            template,
            token: token.value.clone(),
            expires_at: token.expires_at,
            requested_at,
        }
    }
}
