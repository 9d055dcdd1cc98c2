use auth::CredentialError;
use thiserror::Error;

use crate::domain::token::errors::TokenError;
use crate::user::errors::UserError;

/// Error for notification publishing operations
#[derive(Debug, Clone, Error)]
pub enum NotificationError {
    #[error("Failed to serialize notification: {0}")]
    SerializationFailed(String),

    #[error("Failed to publish notification to broker: {0}")]
    PublishFailed(String),
}

/// Top-level error for authentication flows
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("User not found: {0}")]
    SubjectNotFound(String),

    #[error("Password does not meet policy: {0}")]
    WeakPassword(String),

    #[error("Email already exists: {0}")]
    EmailAlreadyExists(String),

    #[error("Insufficient role")]
    Forbidden,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("User store error: {0}")]
    User(UserError),

    #[error("Credential error: {0}")]
    Credential(CredentialError),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<UserError> for AuthError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailAlreadyExists(email) => AuthError::EmailAlreadyExists(email),
            UserError::NotFound(id) => AuthError::SubjectNotFound(id),
            other => AuthError::User(other),
        }
    }
}

impl From<CredentialError> for AuthError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::TooShort { .. } => AuthError::WeakPassword(err.to_string()),
            other => AuthError::Credential(other),
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Unknown(err.to_string())
    }
}
