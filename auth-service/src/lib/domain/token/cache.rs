use std::sync::Arc;
use std::time::Duration;

use auth::TokenPurpose;

use crate::domain::token::errors::CacheError;
use crate::domain::token::ports::CacheStore;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;

/// Best-effort index over the token ledger and the user store.
///
/// Holds two kinds of entries:
/// - `{purpose}:{token}` -> owning user id, living as long as the token
/// - `user:{id}` -> serialized [`UserProfile`]
///
/// Every backend failure degrades to a miss or a no-op and is logged. Losing
/// entries costs latency, never correctness.
pub struct TokenCache<S>
where
    S: CacheStore,
{
    store: Arc<S>,
}

impl<S> TokenCache<S>
where
    S: CacheStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    fn presence_key(purpose: TokenPurpose, value: &str) -> String {
        format!("{}:{}", purpose, value)
    }

    fn profile_key(user_id: &UserId) -> String {
        format!("user:{}", user_id)
    }

    /// Record that a token is outstanding for `ttl_seconds` more seconds.
    ///
    /// Nothing is written when the token has no lifetime left.
    pub async fn mark_present(
        &self,
        purpose: TokenPurpose,
        value: &str,
        user_id: &UserId,
        ttl_seconds: i64,
    ) {
        if ttl_seconds <= 0 {
            return;
        }

        let key = Self::presence_key(purpose, value);
        let ttl = Duration::from_secs(ttl_seconds.unsigned_abs());
        if let Err(e) = self.store.set_with_ttl(&key, user_id.to_string(), ttl).await {
            tracing::warn!(%purpose, error = %e, "Cache write failed for token presence");
        }
    }

    /// Whether the token is marked present; a failed read counts as absent.
    pub async fn is_present(&self, purpose: TokenPurpose, value: &str) -> bool {
        let key = Self::presence_key(purpose, value);
        match self.store.get(&key).await {
            Ok(entry) => entry.is_some(),
            Err(e) => {
                tracing::warn!(%purpose, error = %e, "Cache read failed for token presence");
                false
            }
        }
    }

    /// Drop the presence mark for a token.
    pub async fn evict(&self, purpose: TokenPurpose, value: &str) {
        let key = Self::presence_key(purpose, value);
        if let Err(e) = self.store.delete(&key).await {
            tracing::warn!(%purpose, error = %e, "Cache eviction failed for token presence");
        }
    }

    /// Cache a profile for `ttl`; a zero TTL skips the write.
    pub async fn put_profile(&self, profile: &UserProfile, ttl: Duration) {
        if ttl.is_zero() {
            return;
        }

        let payload = match serde_json::to_string(profile) {
            Ok(payload) => payload,
            Err(e) => {
                let e = CacheError::Serialization(e.to_string());
                tracing::warn!(user_id = %profile.id, error = %e, "Cache write skipped for profile");
                return;
            }
        };

        let key = Self::profile_key(&profile.id);
        if let Err(e) = self.store.set_with_ttl(&key, payload, ttl).await {
            tracing::warn!(user_id = %profile.id, error = %e, "Cache write failed for profile");
        }
    }

    /// Cached profile, if any. Unreadable entries are evicted.
    pub async fn get_profile(&self, user_id: &UserId) -> Option<UserProfile> {
        let key = Self::profile_key(user_id);
        let payload = match self.store.get(&key).await {
            Ok(payload) => payload?,
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "Cache read failed for profile");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(%user_id, error = %e, "Discarding unreadable cached profile");
                self.evict_profile(user_id).await;
                None
            }
        }
    }

    /// Drop the cached profile for a user.
    pub async fn evict_profile(&self, user_id: &UserId) {
        let key = Self::profile_key(user_id);
        if let Err(e) = self.store.delete(&key).await {
            tracing::warn!(%user_id, error = %e, "Cache eviction failed for profile");
        }
    }
}
