use std::sync::Arc;

use async_trait::async_trait;
use auth::TokenClaims;
use auth::TokenCodec;
use auth::TokenPurpose;
use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::clock::Clock;
use crate::domain::token::cache::TokenCache;
use crate::domain::token::errors::TokenError;
use crate::domain::token::models::IssuedToken;
use crate::domain::token::models::Token;
use crate::domain::token::models::TokenFilter;
use crate::domain::token::models::TokenId;
use crate::domain::token::models::TokenPair;
use crate::domain::token::models::TokenSettings;
use crate::domain::token::models::VerifiedToken;
use crate::domain::token::ports::CacheStore;
use crate::domain::token::ports::TokenRepository;
use crate::domain::token::ports::TokenServicePort;
use crate::domain::user::models::UserId;

/// Domain service for the token lifecycle.
///
/// Combines the codec (authenticity and expiry), the ledger (whether a
/// token is still outstanding) and the cache (a shortcut for the ledger).
/// The ledger is always written before the cache.
pub struct TokenService<TR, S>
where
    TR: TokenRepository,
    S: CacheStore,
{
    repository: Arc<TR>,
    cache: Arc<TokenCache<S>>,
    codec: TokenCodec,
    settings: TokenSettings,
    clock: Arc<dyn Clock>,
}

impl<TR, S> TokenService<TR, S>
where
    TR: TokenRepository,
    S: CacheStore,
{
    /// Create a new token service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Token ledger
    /// * `cache` - Shared token cache
    /// * `codec` - Signs and parses tokens
    /// * `settings` - Lifetimes per purpose
    /// * `clock` - Time source for issuance and expiry
    pub fn new(
        repository: Arc<TR>,
        cache: Arc<TokenCache<S>>,
        codec: TokenCodec,
        settings: TokenSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            cache,
            codec,
            settings,
            clock,
        }
    }

    fn mint(
        &self,
        user_id: &UserId,
        purpose: TokenPurpose,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<Token, TokenError> {
        let issued_at = now.timestamp();
        let expires_at = issued_at + ttl.num_seconds();
        let claims = TokenClaims::issue(user_id, purpose, issued_at, expires_at);
        let value = self.codec.encode(&claims)?;

        let id = Uuid::parse_str(&claims.jti)
            .map(TokenId)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;
        let expires_at = DateTime::from_timestamp(expires_at, 0)
            .ok_or_else(|| TokenError::Encoding("expiry out of range".to_string()))?;

        Ok(Token {
            id,
            value,
            user_id: *user_id,
            purpose,
            expires_at,
            revoked: false,
            created_at: now,
        })
    }

    /// Delete rows of (user, purpose) that expired before `now`.
    ///
    /// Runs after the new token is recorded, so a failure is logged rather
    /// than failing the issuance.
    async fn sweep(&self, user_id: &UserId, purpose: TokenPurpose, now: DateTime<Utc>) {
        let filter = TokenFilter::by_owner(*user_id, purpose).expiring_before(now);
        match self.repository.delete_where(&filter).await {
            Ok(swept) if swept.is_empty() => {}
            Ok(swept) => {
                tracing::debug!(%user_id, %purpose, swept = swept.len(), "Swept expired tokens");
            }
            Err(e) => {
                tracing::warn!(%user_id, %purpose, error = %e, "Failed to sweep expired tokens");
            }
        }
    }
}

#[async_trait]
impl<TR, S> TokenServicePort for TokenService<TR, S>
where
    TR: TokenRepository,
    S: CacheStore,
{
    async fn issue(
        &self,
        user_id: &UserId,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let now = self.clock.now();
        let token = self.mint(user_id, purpose, ttl, now)?;
        let token = self.repository.insert(token).await?;

        self.cache
            .mark_present(purpose, &token.value, user_id, token.remaining_seconds(now))
            .await;
        self.sweep(user_id, purpose, now).await;

        tracing::debug!(%user_id, %purpose, token_id = %token.id, "Token issued");
        Ok(IssuedToken::from(&token))
    }

    async fn issue_pair(&self, user_id: &UserId) -> Result<TokenPair, TokenError> {
        let now = self.clock.now();
        let access = self.mint(user_id, TokenPurpose::Access, self.settings.access_ttl, now)?;
        let refresh = self.mint(user_id, TokenPurpose::Refresh, self.settings.refresh_ttl, now)?;

        let recorded = self.repository.bulk_insert(vec![access, refresh]).await?;
        for token in &recorded {
            self.cache
                .mark_present(token.purpose, &token.value, user_id, token.remaining_seconds(now))
                .await;
        }
        self.sweep(user_id, TokenPurpose::Access, now).await;
        self.sweep(user_id, TokenPurpose::Refresh, now).await;

        let pick = |purpose: TokenPurpose| {
            recorded
                .iter()
                .find(|token| token.purpose == purpose)
                .map(IssuedToken::from)
                .ok_or_else(|| TokenError::Ledger(format!("{} token missing from batch", purpose)))
        };

        tracing::debug!(%user_id, "Token pair issued");
        Ok(TokenPair {
            access: pick(TokenPurpose::Access)?,
            refresh: pick(TokenPurpose::Refresh)?,
        })
    }

    async fn verify(
        &self,
        value: &str,
        purpose: TokenPurpose,
    ) -> Result<VerifiedToken, TokenError> {
        let now = self.clock.now();
        let claims = self.codec.decode(value, now.timestamp())?;

        if claims.purpose != purpose {
            return Err(TokenError::WrongPurpose {
                expected: purpose,
                actual: claims.purpose,
            });
        }

        let verified = VerifiedToken::try_from(&claims)?;

        if self.cache.is_present(purpose, value).await {
            return Ok(verified);
        }

        let filter = TokenFilter::by_value(value, purpose)
            .with_user(verified.user_id)
            .with_revoked(false);
        let row = self
            .repository
            .find_one(&filter)
            .await?
            .ok_or(TokenError::NotRecognized)?;

        self.cache
            .mark_present(purpose, value, &row.user_id, row.remaining_seconds(now))
            .await;

        Ok(verified)
    }

    async fn revoke(&self, user_id: &UserId, purpose: TokenPurpose) -> Result<u64, TokenError> {
        let filter = TokenFilter::by_owner(*user_id, purpose);
        let rows = self.repository.delete_where(&filter).await?;

        // Evict exactly what was deleted, including rows recorded after the call began.
        for row in &rows {
            self.cache.evict(purpose, &row.value).await;
        }

        let revoked = rows.len() as u64;
        tracing::debug!(%user_id, %purpose, revoked, "Tokens revoked");
        Ok(revoked)
    }

    async fn revoke_by_id(&self, id: &TokenId) -> Result<(), TokenError> {
        let rows = self.repository.delete_where(&TokenFilter::by_id(*id)).await?;

        for row in &rows {
            self.cache.evict(row.purpose, &row.value).await;
            tracing::debug!(token_id = %id, purpose = %row.purpose, "Token revoked");
        }
        Ok(())
    }

    async fn lookup(
        &self,
        value: &str,
        purpose: TokenPurpose,
    ) -> Result<Option<Token>, TokenError> {
        let filter = TokenFilter::by_value(value, purpose).with_revoked(false);
        self.repository.find_one(&filter).await
    }

    async fn purge_expired(&self) -> Result<u64, TokenError> {
        let filter = TokenFilter::default().expiring_before(self.clock.now());
        let purged = self.repository.delete_where(&filter).await?.len() as u64;

        tracing::debug!(purged, "Purged expired tokens");
        Ok(purged)
    }
}
