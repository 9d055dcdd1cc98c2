use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use auth::TokenPurpose;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::models::Admission;
use crate::domain::auth::ports::GatekeeperPort;
use crate::domain::token::cache::TokenCache;
use crate::domain::token::ports::CacheStore;
use crate::domain::token::ports::TokenServicePort;
use crate::domain::user::models::Role;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::user::ports::UserRepository;

/// Admits requests carrying a valid access token of an enabled user.
///
/// The owner's profile is read from the cache first and from the user store
/// on a miss, repopulating the cache.
pub struct Gatekeeper<UR, TS, S>
where
    UR: UserRepository,
    TS: TokenServicePort,
    S: CacheStore,
{
    users: Arc<UR>,
    tokens: Arc<TS>,
    cache: Arc<TokenCache<S>>,
    profile_ttl: Duration,
}

impl<UR, TS, S> Gatekeeper<UR, TS, S>
where
    UR: UserRepository,
    TS: TokenServicePort,
    S: CacheStore,
{
    pub fn new(
        users: Arc<UR>,
        tokens: Arc<TS>,
        cache: Arc<TokenCache<S>>,
        profile_ttl: Duration,
    ) -> Self {
        Self {
            users,
            tokens,
            cache,
            profile_ttl,
        }
    }

    async fn resolve_profile(&self, user_id: &UserId) -> Result<UserProfile, AuthError> {
        if let Some(profile) = self.cache.get_profile(user_id).await {
            return Ok(profile);
        }

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::SubjectNotFound(user_id.to_string()))?;

        let profile = UserProfile::from(&user);
        self.cache.put_profile(&profile, self.profile_ttl).await;
        Ok(profile)
    }
}

#[async_trait]
impl<UR, TS, S> GatekeeperPort for Gatekeeper<UR, TS, S>
where
    UR: UserRepository,
    TS: TokenServicePort,
    S: CacheStore,
{
    async fn admit(&self, bearer: &str) -> Result<Admission, AuthError> {
        let verified = self.tokens.verify(bearer, TokenPurpose::Access).await?;
        let profile = self.resolve_profile(&verified.user_id).await?;

        if !profile.is_enabled() {
            return Err(AuthError::SubjectNotFound(profile.id.to_string()));
        }

        Ok(Admission {
            profile,
            expires_at: verified.expires_at,
        })
    }
}

/// Role check applied after admission.
pub fn authorize(profile: &UserProfile, allowed: &[Role]) -> Result<(), AuthError> {
    if allowed.contains(&profile.role) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
