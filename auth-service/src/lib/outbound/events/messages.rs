use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::config::NotificationsConfig;
use crate::domain::auth::events::NotificationRequestedEvent;
use crate::domain::auth::events::NotificationTemplate;

/// Serializable message for a NotificationRequested domain event.
///
/// Infrastructure representation consumed by the mail sender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub event_id: String,
    pub recipient: String,
    pub template: String,
    pub token: String,
    pub link: String,
    pub expires_at: DateTime<Utc>,
    pub requested_at: DateTime<Utc>,
}

impl NotificationMessage {
    /// Build the message, resolving the link the mail should point to.
    pub fn from_event(event: &NotificationRequestedEvent, links: &NotificationsConfig) -> Self {
        let base = match event.template {
            NotificationTemplate::VerifyEmail => &links.verify_email_url,
            NotificationTemplate::ResetPassword => &links.reset_password_url,
        };

        Self {
            event_id: event.event_id.clone(),
            recipient: event.recipient.clone(),
            template: event.template.as_str().to_string(),
            token: event.token.clone(),
            link: format!("{}/{}", base.trim_end_matches('/'), event.token),
            expires_at: event.expires_at,
            requested_at: event.requested_at,
        }
    }
}
