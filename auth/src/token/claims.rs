use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use super::purpose::TokenPurpose;

/// Claims carried by every issued token.
///
/// The signature covers all fields, so subject, purpose and both timestamps
/// are tamper-evident. `jti` makes two tokens minted in the same second for
/// the same subject and purpose distinct values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    /// Subject (user identifier)
    pub sub: String,

    /// Issued at (Unix timestamp, seconds)
    pub iat: i64,

    /// Expiration time (Unix timestamp, seconds)
    pub exp: i64,

    /// Unique token identifier
    pub jti: String,

    #[serde(rename = "type")]
    pub purpose: TokenPurpose,
}

impl TokenClaims {
    /// Claims for a brand new token with a random identifier.
    pub fn issue(subject: impl ToString, purpose: TokenPurpose, issued_at: i64, expires_at: i64) -> Self {
        Self {
            sub: subject.to_string(),
            iat: issued_at,
            exp: expires_at,
            jti: Uuid::new_v4().to_string(),
            purpose,
        }
    }

    /// A token is expired from the second its expiry is reached.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.exp
    }
}
