use chrono::DateTime;
use chrono::Utc;

use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::UserProfile;

/// Command to register a new user with domain types
#[derive(Debug)]
pub struct RegisterCommand {
    pub email: EmailAddress,
    pub name: String,
    pub password: String,
}

impl RegisterCommand {
    /// Construct a new register command.
    ///
    /// # Arguments
    /// * `email` - Validated email address
    /// * `name` - Display name
    /// * `password` - Plain text password (checked and hashed by service)
    ///
    /// # Returns
    /// RegisterCommand with validated fields
    pub fn new(email: EmailAddress, name: String, password: String) -> Self {
        Self {
            email,
            name,
            password,
        }
    }
}

/// Command to replace the password of an authenticated user
#[derive(Debug)]
pub struct ChangePasswordCommand {
    pub current_password: String,
    pub new_password: String,
}

/// Outcome of admitting a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admission {
    pub profile: UserProfile,
    pub expires_at: DateTime<Utc>,
}
