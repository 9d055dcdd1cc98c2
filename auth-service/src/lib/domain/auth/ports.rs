use async_trait::async_trait;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::errors::NotificationError;
use crate::domain::auth::events::NotificationRequestedEvent;
use crate::domain::auth::models::Admission;
use crate::domain::auth::models::ChangePasswordCommand;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::token::models::TokenPair;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;

/// Port for authentication flows.
#[async_trait]
pub trait AuthServicePort: Send + Sync + 'static {
    /// Register a user pending email verification and mail them a
    /// verify-email token.
    ///
    /// # Arguments
    /// * `command` - Validated email, name and raw password
    ///
    /// # Returns
    /// Profile of the created user
    ///
    /// # Errors
    /// * `WeakPassword` - Password fails the policy
    /// * `EmailAlreadyExists` - Email held by another non-retired user
    /// * `User` - User store failed
    /// * `Token` - Verify-email token could not be issued
    async fn register(&self, command: RegisterCommand) -> Result<UserProfile, AuthError>;

    /// Check a user's password. Token issuance is left to the caller.
    ///
    /// # Arguments
    /// * `email` - Email of an enabled user
    /// * `password` - Raw password
    ///
    /// # Returns
    /// Profile of the authenticated user, without credentials
    ///
    /// # Errors
    /// * `SubjectNotFound` - No enabled user with this email
    /// * `InvalidCredential` - Password does not match
    async fn login(&self, email: &EmailAddress, password: &str)
        -> Result<UserProfile, AuthError>;

    /// Exchange a refresh token for a new pair. The presented token is revoked.
    ///
    /// # Errors
    /// * `Token` - Refresh token not valid
    /// * `SubjectNotFound` - Owner no longer enabled
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;

    /// Revoke every access and refresh token of the refresh token's owner.
    ///
    /// Unknown or already revoked tokens are accepted silently.
    ///
    /// # Errors
    /// * `Token` - Ledger failure
    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError>;

    /// Consume a verify-email token: mark the email verified and enable the user.
    ///
    /// # Errors
    /// * `Token` - Token not valid, including `WrongPurpose`
    /// * `SubjectNotFound` - Owner missing or retired
    async fn complete_email_verification(&self, token: &str) -> Result<(), AuthError>;

    /// Mail a reset-password token to an enabled user.
    ///
    /// # Errors
    /// * `SubjectNotFound` - No enabled user with this email
    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), AuthError>;

    /// Consume a reset-password token and store a new password.
    ///
    /// # Errors
    /// * `WeakPassword` - New password fails the policy
    /// * `Token` - Token not valid
    /// * `SubjectNotFound` - Owner missing or retired
    async fn complete_reset_password(&self, token: &str, new_password: &str)
        -> Result<(), AuthError>;

    /// Replace the password of an authenticated user.
    ///
    /// # Errors
    /// * `InvalidCredential` - Current password does not match
    /// * `WeakPassword` - New password fails the policy
    /// * `SubjectNotFound` - User missing
    async fn change_password(
        &self,
        user_id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), AuthError>;

    /// Fetch a user's profile from the store.
    ///
    /// # Errors
    /// * `SubjectNotFound` - No such user
    async fn get_profile(&self, user_id: &UserId) -> Result<UserProfile, AuthError>;
}

/// Per-request admission of bearer tokens.
#[async_trait]
pub trait GatekeeperPort: Send + Sync + 'static {
    /// Verify an access token and resolve its enabled owner.
    ///
    /// # Arguments
    /// * `bearer` - Token from the Authorization header
    ///
    /// # Returns
    /// Profile of the authenticated user and the token's expiry
    ///
    /// # Errors
    /// Any error means "unauthenticated". The variant is for logs only.
    async fn admit(&self, bearer: &str) -> Result<Admission, AuthError>;
}

/// Outbound notification requests (mail delivery happens elsewhere).
#[async_trait]
pub trait NotificationPublisher: Send + Sync + 'static {
    /// Publish a notification request.
    ///
    /// # Arguments
    /// * `event` - NotificationRequested event
    ///
    /// # Returns
    /// Unit on success
    ///
    /// # Errors
    /// * `SerializationFailed` - Event serialization failed
    /// * `PublishFailed` - Failed to publish to broker
    async fn publish_notification(
        &self,
        event: &NotificationRequestedEvent,
    ) -> Result<(), NotificationError>;
}
