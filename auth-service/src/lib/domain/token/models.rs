use std::fmt;

use auth::TokenClaims;
use auth::TokenPurpose;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::token::errors::TokenError;
use crate::domain::user::models::UserId;

/// Ledger row identifier. Equal to the `jti` claim of the token it records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenId(pub Uuid);

impl TokenId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Ledger record of an outstanding token.
///
/// A token is valid iff its row exists, it is not revoked and `now < expires_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub id: TokenId,
    pub value: String,
    pub user_id: UserId,
    pub purpose: TokenPurpose,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl Token {
    /// Seconds left before expiry, zero once expired.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// A freshly issued token as handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl From<&Token> for IssuedToken {
    fn from(token: &Token) -> Self {
        Self {
            value: token.value.clone(),
            expires_at: token.expires_at,
        }
    }
}

/// Access and refresh tokens issued together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Outcome of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub id: TokenId,
    pub user_id: UserId,
    pub purpose: TokenPurpose,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<&TokenClaims> for VerifiedToken {
    type Error = TokenError;

    fn try_from(claims: &TokenClaims) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&claims.jti)
            .map(TokenId)
            .map_err(|e| TokenError::Malformed(format!("jti: {}", e)))?;
        let user_id = UserId::from_string(&claims.sub)
            .map_err(|e| TokenError::Malformed(format!("sub: {}", e)))?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0)
            .ok_or_else(|| TokenError::Malformed("exp out of range".to_string()))?;

        Ok(Self {
            id,
            user_id,
            purpose: claims.purpose,
            expires_at,
        })
    }
}

/// Lifetimes of each token purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSettings {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub verify_email_ttl: Duration,
    pub reset_password_ttl: Duration,
}

impl TokenSettings {
    pub fn ttl_for(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::Access => self.access_ttl,
            TokenPurpose::Refresh => self.refresh_ttl,
            TokenPurpose::VerifyEmail => self.verify_email_ttl,
            TokenPurpose::ResetPassword => self.reset_password_ttl,
        }
    }
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            access_ttl: Duration::minutes(30),
            refresh_ttl: Duration::days(30),
            verify_email_ttl: Duration::minutes(10),
            reset_password_ttl: Duration::minutes(10),
        }
    }
}

/// Conjunctive predicate over ledger rows. Unset fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenFilter {
    pub id: Option<TokenId>,
    pub value: Option<String>,
    pub user_id: Option<UserId>,
    pub purpose: Option<TokenPurpose>,
    pub revoked: Option<bool>,
    pub expires_before: Option<DateTime<Utc>>,
}

impl TokenFilter {
    pub fn by_id(id: TokenId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    pub fn by_value(value: &str, purpose: TokenPurpose) -> Self {
        Self {
            value: Some(value.to_string()),
            purpose: Some(purpose),
            ..Self::default()
        }
    }

    pub fn by_owner(user_id: UserId, purpose: TokenPurpose) -> Self {
        Self {
            user_id: Some(user_id),
            purpose: Some(purpose),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_revoked(mut self, revoked: bool) -> Self {
        self.revoked = Some(revoked);
        self
    }

    pub fn expiring_before(mut self, at: DateTime<Utc>) -> Self {
        self.expires_before = Some(at);
        self
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Evaluate the predicate against a row.
    pub fn matches(&self, token: &Token) -> bool {
        self.id.map_or(true, |id| token.id == id)
            && self.value.as_ref().map_or(true, |v| &token.value == v)
            && self.user_id.map_or(true, |u| token.user_id == u)
            && self.purpose.map_or(true, |p| token.purpose == p)
            && self.revoked.map_or(true, |r| token.revoked == r)
            && self.expires_before.map_or(true, |at| token.expires_at < at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(purpose: TokenPurpose, expires_at: DateTime<Utc>) -> Token {
        Token {
            id: TokenId::new(),
            value: "value".to_string(),
            user_id: UserId::new(),
            purpose,
            expires_at,
            revoked: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_matches_conjunctively() {
        let now = Utc::now();
        let row = token(TokenPurpose::Refresh, now);

        assert!(TokenFilter::default().matches(&row));
        assert!(TokenFilter::by_owner(row.user_id, TokenPurpose::Refresh).matches(&row));
        assert!(!TokenFilter::by_owner(row.user_id, TokenPurpose::Access).matches(&row));
        assert!(!TokenFilter::by_value("value", TokenPurpose::Refresh)
            .with_revoked(true)
            .matches(&row));
    }

    #[test]
    fn test_filter_expires_before_is_strict() {
        let now = Utc::now();
        let row = token(TokenPurpose::Access, now);

        assert!(!TokenFilter::default().expiring_before(now).matches(&row));
        assert!(TokenFilter::default()
            .expiring_before(now + Duration::seconds(1))
            .matches(&row));
    }

    #[test]
    fn test_verified_token_from_claims() {
        let user_id = UserId::new();
        let claims = TokenClaims::issue(&user_id.to_string(), TokenPurpose::Access, 100, 160);

        let verified = VerifiedToken::try_from(&claims).unwrap();
        assert_eq!(verified.user_id, user_id);
        assert_eq!(verified.id.to_string(), claims.jti);
        assert_eq!(verified.expires_at.timestamp(), 160);
    }

    #[test]
    fn test_verified_token_rejects_foreign_subject() {
        let claims = TokenClaims::issue("not-a-uuid", TokenPurpose::Access, 100, 160);
        assert!(matches!(
            VerifiedToken::try_from(&claims),
            Err(TokenError::Malformed(_))
        ));
    }
}
