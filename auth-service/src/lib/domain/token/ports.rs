use std::time::Duration;

use async_trait::async_trait;
use auth::TokenPurpose;

use crate::domain::token::errors::CacheError;
use crate::domain::token::errors::TokenError;
use crate::domain::token::models::IssuedToken;
use crate::domain::token::models::Token;
use crate::domain::token::models::TokenFilter;
use crate::domain::token::models::TokenId;
use crate::domain::token::models::TokenPair;
use crate::domain::token::models::VerifiedToken;
use crate::domain::user::models::UserId;

/// Port for token lifecycle operations.
#[async_trait]
pub trait TokenServicePort: Send + Sync + 'static {
    /// Mint a token, record it in the ledger and mark it present in the cache.
    ///
    /// Expired rows of the same user and purpose are swept as a side effect.
    ///
    /// # Arguments
    /// * `user_id` - Owner of the token
    /// * `purpose` - What the token may be used for
    /// * `ttl` - Lifetime from now
    ///
    /// # Returns
    /// Token value and absolute expiry
    ///
    /// # Errors
    /// * `Encoding` - Signing failed
    /// * `Ledger` - Ledger write failed
    async fn issue(
        &self,
        user_id: &UserId,
        purpose: TokenPurpose,
        ttl: chrono::Duration,
    ) -> Result<IssuedToken, TokenError>;

    /// Issue an access and a refresh token in one ledger batch.
    ///
    /// # Arguments
    /// * `user_id` - Owner of both tokens
    ///
    /// # Returns
    /// The new token pair
    ///
    /// # Errors
    /// * `Encoding` - Signing failed
    /// * `Ledger` - Ledger write failed
    async fn issue_pair(&self, user_id: &UserId) -> Result<TokenPair, TokenError>;

    /// Check that a token is authentic, unexpired, of the expected purpose
    /// and still outstanding.
    ///
    /// # Arguments
    /// * `value` - Token as presented by the client
    /// * `purpose` - Purpose the caller requires
    ///
    /// # Returns
    /// Identity and owner of the token
    ///
    /// # Errors
    /// * `Malformed` - Not a token
    /// * `BadSignature` - Not signed by us
    /// * `Expired` - Embedded expiry has passed
    /// * `WrongPurpose` - Minted for another purpose
    /// * `NotRecognized` - Revoked or never recorded
    /// * `Ledger` - Ledger read failed
    async fn verify(&self, value: &str, purpose: TokenPurpose)
        -> Result<VerifiedToken, TokenError>;

    /// Revoke every token of a user for one purpose.
    ///
    /// # Returns
    /// Number of ledger rows removed
    ///
    /// # Errors
    /// * `Ledger` - Ledger operation failed
    async fn revoke(&self, user_id: &UserId, purpose: TokenPurpose) -> Result<u64, TokenError>;

    /// Revoke a single token. Revoking an unknown id is not an error.
    ///
    /// # Errors
    /// * `Ledger` - Ledger operation failed
    async fn revoke_by_id(&self, id: &TokenId) -> Result<(), TokenError>;

    /// Find the ledger row of a token without verifying it.
    ///
    /// # Returns
    /// The row if the token is outstanding for this purpose
    ///
    /// # Errors
    /// * `Ledger` - Ledger read failed
    async fn lookup(&self, value: &str, purpose: TokenPurpose)
        -> Result<Option<Token>, TokenError>;

    /// Remove every expired row from the ledger.
    ///
    /// # Returns
    /// Number of ledger rows removed
    ///
    /// # Errors
    /// * `Ledger` - Ledger operation failed
    async fn purge_expired(&self) -> Result<u64, TokenError>;
}

/// Durable record of outstanding tokens.
///
/// No uniqueness is enforced on (user, purpose).
#[async_trait]
pub trait TokenRepository: Send + Sync + 'static {
    /// Record a token.
    ///
    /// # Errors
    /// * `Ledger` - Write failed
    async fn insert(&self, token: Token) -> Result<Token, TokenError>;

    /// Record several tokens in one batch.
    ///
    /// # Errors
    /// * `Ledger` - Write failed; no row of the batch is recorded
    async fn bulk_insert(&self, tokens: Vec<Token>) -> Result<Vec<Token>, TokenError>;

    /// First row matching the filter, if any.
    ///
    /// # Errors
    /// * `Ledger` - Read failed
    async fn find_one(&self, filter: &TokenFilter) -> Result<Option<Token>, TokenError>;

    /// All rows matching the filter.
    ///
    /// # Errors
    /// * `Ledger` - Read failed
    async fn find_many(&self, filter: &TokenFilter) -> Result<Vec<Token>, TokenError>;

    /// Delete rows matching the filter.
    ///
    /// # Returns
    /// The rows removed by this call, read and deleted in one step
    ///
    /// # Errors
    /// * `Ledger` - Delete failed, or the filter is empty
    async fn delete_where(&self, filter: &TokenFilter) -> Result<Vec<Token>, TokenError>;
}

/// Key-value store with optional per-key expiry.
///
/// Backends are allowed to fail; callers go through
/// [`TokenCache`](super::cache::TokenCache), which absorbs those failures.
#[async_trait]
pub trait CacheStore: Send + Sync + 'static {
    /// # Errors
    /// * `Unavailable` - Backend could not be reached
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store without expiry.
    ///
    /// # Errors
    /// * `Unavailable` - Backend could not be reached
    async fn set(&self, key: &str, value: String) -> Result<(), CacheError>;

    /// Store with a time to live.
    ///
    /// # Errors
    /// * `Unavailable` - Backend could not be reached
    async fn set_with_ttl(&self, key: &str, value: String, ttl: Duration)
        -> Result<(), CacheError>;

    /// # Errors
    /// * `Unavailable` - Backend could not be reached
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
