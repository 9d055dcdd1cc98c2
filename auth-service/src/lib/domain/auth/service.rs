use std::sync::Arc;

use async_trait::async_trait;
use auth::CredentialHasher;
use auth::PasswordPolicy;
use auth::TokenPurpose;

use crate::domain::auth::errors::AuthError;
use crate::domain::auth::events::NotificationRequestedEvent;
use crate::domain::auth::events::NotificationTemplate;
use crate::domain::auth::models::ChangePasswordCommand;
use crate::domain::auth::models::RegisterCommand;
use crate::domain::auth::ports::AuthServicePort;
use crate::domain::auth::ports::NotificationPublisher;
use crate::domain::clock::Clock;
use crate::domain::token::cache::TokenCache;
use crate::domain::token::models::TokenPair;
use crate::domain::token::models::TokenSettings;
use crate::domain::token::ports::CacheStore;
use crate::domain::token::ports::TokenServicePort;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::Role;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::UserProfile;
use crate::domain::user::models::UserStatus;
use crate::user::ports::UserRepository;

/// Domain service for credential and email-confirmation flows.
///
/// Every mutation of a user evicts that user's cached profile.
pub struct AuthService<UR, TS, NP, S>
where
    UR: UserRepository,
    TS: TokenServicePort,
    NP: NotificationPublisher,
    S: CacheStore,
{
    users: Arc<UR>,
    tokens: Arc<TS>,
    notifications: Arc<NP>,
    cache: Arc<TokenCache<S>>,
    settings: TokenSettings,
    clock: Arc<dyn Clock>,
    hasher: CredentialHasher,
    policy: PasswordPolicy,
}

impl<UR, TS, NP, S> AuthService<UR, TS, NP, S>
where
    UR: UserRepository,
    TS: TokenServicePort,
    NP: NotificationPublisher,
    S: CacheStore,
{
    /// Create a new auth service with injected dependencies.
    ///
    /// # Arguments
    /// * `users` - User persistence implementation
    /// * `tokens` - Token lifecycle service
    /// * `notifications` - Notification publishing implementation
    /// * `cache` - Shared token cache, for profile eviction
    /// * `settings` - Token lifetimes
    /// * `clock` - Time source for record timestamps
    ///
    /// # Returns
    /// Configured auth service instance
    pub fn new(
        users: Arc<UR>,
        tokens: Arc<TS>,
        notifications: Arc<NP>,
        cache: Arc<TokenCache<S>>,
        settings: TokenSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            tokens,
            notifications,
            cache,
            settings,
            clock,
            hasher: CredentialHasher::new(),
            policy: PasswordPolicy::default(),
        }
    }

    async fn enabled_user_by_email(&self, email: &EmailAddress) -> Result<User, AuthError> {
        self.users
            .find_by_email(email)
            .await?
            .filter(User::is_enabled)
            .ok_or_else(|| AuthError::SubjectNotFound(email.to_string()))
    }

    async fn live_user_by_id(&self, id: &UserId) -> Result<User, AuthError> {
        self.users
            .find_by_id(id)
            .await?
            .filter(|user| user.status != UserStatus::Retired)
            .ok_or_else(|| AuthError::SubjectNotFound(id.to_string()))
    }

    async fn save(&self, mut user: User) -> Result<User, AuthError> {
        user.updated_at = self.clock.now();
        let user = self.users.update(user).await?;
        self.cache.evict_profile(&user.id).await;
        Ok(user)
    }

    async fn send_token(
        &self,
        user: &User,
        purpose: TokenPurpose,
        template: NotificationTemplate,
    ) -> Result<(), AuthError> {
        let token = self
            .tokens
            .issue(&user.id, purpose, self.settings.ttl_for(purpose))
            .await?;

        let event =
            NotificationRequestedEvent::new(&user.email, template, &token, self.clock.now());
        if let Err(e) = self.notifications.publish_notification(&event).await {
            tracing::error!(
                "Failed to publish {} notification for user {}: {}",
                template,
                user.id,
                e
            );
        }

        Ok(())
    }
}

#[async_trait]
impl<UR, TS, NP, S> AuthServicePort for AuthService<UR, TS, NP, S>
where
    UR: UserRepository,
    TS: TokenServicePort,
    NP: NotificationPublisher,
    S: CacheStore,
{
    async fn register(&self, command: RegisterCommand) -> Result<UserProfile, AuthError> {
        self.policy.check(&command.password)?;

        if self.users.find_by_email(&command.email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists(command.email.to_string()));
        }

        let now = self.clock.now();
        let user = User {
            id: UserId::new(),
            email: command.email,
            name: command.name,
            password_hash: self.hasher.hash(&command.password)?,
            role: Role::Staff,
            status: UserStatus::PendingVerification,
            email_verified: false,
            created_at: now,
            updated_at: now,
        };

        let user = self.users.create(user).await?;
        tracing::info!(user_id = %user.id, "User registered, awaiting email verification");

        self.send_token(&user, TokenPurpose::VerifyEmail, NotificationTemplate::VerifyEmail)
            .await?;

        Ok(UserProfile::from(&user))
    }

    async fn login(
        &self,
        email: &EmailAddress,
        password: &str,
    ) -> Result<UserProfile, AuthError> {
        let user = self.enabled_user_by_email(email).await?;

        if !self.hasher.verify(password, &user.password_hash)? {
            return Err(AuthError::InvalidCredential);
        }

        Ok(UserProfile::from(&user))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let verified = self.tokens.verify(refresh_token, TokenPurpose::Refresh).await?;

        let user = self
            .users
            .find_by_id(&verified.user_id)
            .await?
            .filter(User::is_enabled)
            .ok_or_else(|| AuthError::SubjectNotFound(verified.user_id.to_string()))?;

        self.tokens.revoke_by_id(&verified.id).await?;
        Ok(self.tokens.issue_pair(&user.id).await?)
    }

    async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let Some(row) = self.tokens.lookup(refresh_token, TokenPurpose::Refresh).await? else {
            tracing::debug!("Logout with unknown refresh token, nothing to revoke");
            return Ok(());
        };

        self.tokens.revoke(&row.user_id, TokenPurpose::Access).await?;
        self.tokens.revoke(&row.user_id, TokenPurpose::Refresh).await?;
        self.cache.evict_profile(&row.user_id).await;

        tracing::info!(user_id = %row.user_id, "User logged out");
        Ok(())
    }

    async fn complete_email_verification(&self, token: &str) -> Result<(), AuthError> {
        let verified = self.tokens.verify(token, TokenPurpose::VerifyEmail).await?;
        let mut user = self.live_user_by_id(&verified.user_id).await?;

        user.email_verified = true;
        user.status = UserStatus::Enabled;
        let user = self.save(user).await?;

        self.tokens.revoke_by_id(&verified.id).await?;

        tracing::info!(user_id = %user.id, "Email verified");
        Ok(())
    }

    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), AuthError> {
        let user = self.enabled_user_by_email(email).await?;

        self.send_token(&user, TokenPurpose::ResetPassword, NotificationTemplate::ResetPassword)
            .await
    }

    async fn complete_reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        self.policy.check(new_password)?;

        let verified = self.tokens.verify(token, TokenPurpose::ResetPassword).await?;
        let mut user = self.live_user_by_id(&verified.user_id).await?;

        user.password_hash = self.hasher.hash(new_password)?;
        let user = self.save(user).await?;

        self.tokens.revoke_by_id(&verified.id).await?;

        tracing::info!(user_id = %user.id, "Password reset completed");
        Ok(())
    }

    async fn change_password(
        &self,
        user_id: &UserId,
        command: ChangePasswordCommand,
    ) -> Result<(), AuthError> {
        let mut user = self.live_user_by_id(user_id).await?;

        if !self.hasher.verify(&command.current_password, &user.password_hash)? {
            return Err(AuthError::InvalidCredential);
        }
        self.policy.check(&command.new_password)?;

        user.password_hash = self.hasher.hash(&command.new_password)?;
        self.save(user).await?;

        tracing::info!(%user_id, "Password changed");
        Ok(())
    }

    async fn get_profile(&self, user_id: &UserId) -> Result<UserProfile, AuthError> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(|user| UserProfile::from(&user))
            .ok_or_else(|| AuthError::SubjectNotFound(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use auth::TokenCodec;
    use chrono::Utc;
    use mockall::mock;

    use super::*;
    use crate::domain::auth::errors::NotificationError;
    use crate::domain::clock::ManualClock;
    use crate::domain::token::errors::TokenError;
    use crate::domain::token::service::TokenService;
    use crate::outbound::cache::MokaCacheStore;
    use crate::outbound::repositories::InMemoryTokenRepository;
    use crate::user::errors::UserError;

    mock! {
        pub TestUserRepository {}

        #[async_trait]
        impl UserRepository for TestUserRepository {
            async fn create(&self, user: User) -> Result<User, UserError>;
            async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError>;
            async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, UserError>;
            async fn update(&self, user: User) -> Result<User, UserError>;
        }
    }

    mock! {
        pub TestNotificationPublisher {}

        #[async_trait]
        impl NotificationPublisher for TestNotificationPublisher {
            async fn publish_notification(&self, event: &NotificationRequestedEvent) -> Result<(), NotificationError>;
        }
    }

    type Tokens = TokenService<InMemoryTokenRepository, MokaCacheStore>;
    type Service =
        AuthService<MockTestUserRepository, Tokens, MockTestNotificationPublisher, MokaCacheStore>;

    struct Fixture {
        service: Service,
        tokens: Arc<Tokens>,
        cache: Arc<TokenCache<MokaCacheStore>>,
    }

    fn fixture(users: MockTestUserRepository, notifications: MockTestNotificationPublisher) -> Fixture {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
        let cache = Arc::new(TokenCache::new(Arc::new(MokaCacheStore::new(1_000))));
        let tokens = Arc::new(TokenService::new(
            Arc::new(InMemoryTokenRepository::new()),
            Arc::clone(&cache),
            TokenCodec::new(b"test-secret-key-for-jwt-signing-at-least-32-bytes"),
            TokenSettings::default(),
            Arc::clone(&clock),
        ));
        let service = AuthService::new(
            Arc::new(users),
            Arc::clone(&tokens),
            Arc::new(notifications),
            Arc::clone(&cache),
            TokenSettings::default(),
            clock,
        );

        Fixture {
            service,
            tokens,
            cache,
        }
    }

    fn user(status: UserStatus, password: &str) -> User {
        let now = Utc::now();
        User {
            id: UserId::new(),
            email: EmailAddress::new("jane@example.com".to_string()).unwrap(),
            name: "Jane".to_string(),
            password_hash: CredentialHasher::new().hash(password).unwrap(),
            role: Role::Staff,
            status,
            email_verified: status == UserStatus::Enabled,
            created_at: now,
            updated_at: now,
        }
    }

    fn email() -> EmailAddress {
        EmailAddress::new("Jane@Example.com".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_register_creates_pending_user_and_mails_token() {
        let mut users = MockTestUserRepository::new();
        let mut notifications = MockTestNotificationPublisher::new();

        users.expect_find_by_email().times(1).returning(|_| Ok(None));
        users
            .expect_create()
            .withf(|user| {
                user.email.as_str() == "jane@example.com"
                    && user.status == UserStatus::PendingVerification
                    && !user.email_verified
                    && user.role == Role::Staff
                    && user.password_hash.starts_with("$argon2")
            })
            .times(1)
            .returning(|user| Ok(user));

        let sent = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&sent);
        notifications
            .expect_publish_notification()
            .times(1)
            .returning(move |event| {
                captured.lock().unwrap().push(event.clone());
                Ok(())
            });

        let f = fixture(users, notifications);
        let profile = f
            .service
            .register(RegisterCommand::new(email(), "Jane".to_string(), "password123".to_string()))
            .await
            .unwrap();

        assert_eq!(profile.status, UserStatus::PendingVerification);

        let event = sent.lock().unwrap()[0].clone();
        assert_eq!(event.template, NotificationTemplate::VerifyEmail);
        assert_eq!(event.recipient, "jane@example.com");
        let verified = f
            .tokens
            .verify(&event.token, TokenPurpose::VerifyEmail)
            .await
            .unwrap();
        assert_eq!(verified.user_id, profile.id);
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let mut users = MockTestUserRepository::new();
        users.expect_create().times(0);

        let f = fixture(users, MockTestNotificationPublisher::new());
        let result = f
            .service
            .register(RegisterCommand::new(email(), "Jane".to_string(), "short".to_string()))
            .await;

        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_email()
            .times(1)
            .returning(|_| Ok(Some(user(UserStatus::Enabled, "password123"))));
        users.expect_create().times(0);

        let f = fixture(users, MockTestNotificationPublisher::new());
        let result = f
            .service
            .register(RegisterCommand::new(email(), "Jane".to_string(), "password123".to_string()))
            .await;

        assert!(matches!(result, Err(AuthError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn test_register_survives_notification_failure() {
        let mut users = MockTestUserRepository::new();
        let mut notifications = MockTestNotificationPublisher::new();

        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_create().returning(|user| Ok(user));
        notifications
            .expect_publish_notification()
            .times(1)
            .returning(|_| Err(NotificationError::PublishFailed("broker down".to_string())));

        let f = fixture(users, notifications);
        let result = f
            .service
            .register(RegisterCommand::new(email(), "Jane".to_string(), "password123".to_string()))
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_login_success_returns_profile_only() {
        let existing = user(UserStatus::Enabled, "password123");
        let returned = existing.clone();

        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_email()
            .withf(|email| email.as_str() == "jane@example.com")
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));

        let f = fixture(users, MockTestNotificationPublisher::new());
        let profile = f.service.login(&email(), "password123").await.unwrap();

        assert_eq!(profile.id, existing.id);
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains(&existing.password_hash));
        assert!(!json.contains("argon2"));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let existing = user(UserStatus::Enabled, "password123");
        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));

        let f = fixture(users, MockTestNotificationPublisher::new());
        let result = f.service.login(&email(), "wrong-password").await;

        assert!(matches!(result, Err(AuthError::InvalidCredential)));
    }

    #[tokio::test]
    async fn test_login_requires_enabled_user() {
        for status in [UserStatus::PendingVerification, UserStatus::Disabled] {
            let existing = user(status, "password123");
            let mut users = MockTestUserRepository::new();
            users
                .expect_find_by_email()
                .returning(move |_| Ok(Some(existing.clone())));

            let f = fixture(users, MockTestNotificationPublisher::new());
            let result = f.service.login(&email(), "password123").await;

            assert!(matches!(result, Err(AuthError::SubjectNotFound(_))));
        }

        let mut users = MockTestUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let f = fixture(users, MockTestNotificationPublisher::new());
        assert!(matches!(
            f.service.login(&email(), "password123").await,
            Err(AuthError::SubjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_rotates_refresh_token() {
        let existing = user(UserStatus::Enabled, "password123");
        let user_id = existing.id;
        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));

        let f = fixture(users, MockTestNotificationPublisher::new());
        let first = f.tokens.issue_pair(&user_id).await.unwrap();

        let second = f.service.refresh(&first.refresh.value).await.unwrap();
        assert_ne!(second.refresh.value, first.refresh.value);

        assert!(matches!(
            f.service.refresh(&first.refresh.value).await,
            Err(AuthError::Token(TokenError::NotRecognized))
        ));
        assert!(f
            .tokens
            .verify(&second.refresh.value, TokenPurpose::Refresh)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let f = fixture(MockTestUserRepository::new(), MockTestNotificationPublisher::new());
        let pair = f.tokens.issue_pair(&UserId::new()).await.unwrap();

        assert!(matches!(
            f.service.refresh(&pair.access.value).await,
            Err(AuthError::Token(TokenError::WrongPurpose { .. }))
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_all_session_tokens_and_is_idempotent() {
        let f = fixture(MockTestUserRepository::new(), MockTestNotificationPublisher::new());
        let user_id = UserId::new();
        let first = f.tokens.issue_pair(&user_id).await.unwrap();
        let second = f.tokens.issue_pair(&user_id).await.unwrap();

        f.service.logout(&first.refresh.value).await.unwrap();
        f.service.logout(&first.refresh.value).await.unwrap();
        f.service.logout("never-issued").await.unwrap();

        for (value, purpose) in [
            (&first.access.value, TokenPurpose::Access),
            (&first.refresh.value, TokenPurpose::Refresh),
            (&second.access.value, TokenPurpose::Access),
            (&second.refresh.value, TokenPurpose::Refresh),
        ] {
            assert_eq!(
                f.tokens.verify(value, purpose).await,
                Err(TokenError::NotRecognized)
            );
        }
    }

    #[tokio::test]
    async fn test_complete_email_verification_enables_user() {
        let pending = user(UserStatus::PendingVerification, "password123");
        let user_id = pending.id;
        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_id()
            .times(1)
            .returning(move |_| Ok(Some(pending.clone())));
        users
            .expect_update()
            .withf(|user| user.email_verified && user.status == UserStatus::Enabled)
            .times(1)
            .returning(|user| Ok(user));

        let f = fixture(users, MockTestNotificationPublisher::new());
        let token = f
            .tokens
            .issue(&user_id, TokenPurpose::VerifyEmail, chrono::Duration::minutes(10))
            .await
            .unwrap();

        f.service.complete_email_verification(&token.value).await.unwrap();

        assert_eq!(
            f.tokens.verify(&token.value, TokenPurpose::VerifyEmail).await,
            Err(TokenError::NotRecognized)
        );
    }

    #[tokio::test]
    async fn test_complete_email_verification_with_reset_token() {
        let mut users = MockTestUserRepository::new();
        users.expect_find_by_id().times(0);
        users.expect_update().times(0);

        let f = fixture(users, MockTestNotificationPublisher::new());
        let user_id = UserId::new();
        let token = f
            .tokens
            .issue(&user_id, TokenPurpose::ResetPassword, chrono::Duration::minutes(10))
            .await
            .unwrap();

        let result = f.service.complete_email_verification(&token.value).await;
        assert!(matches!(
            result,
            Err(AuthError::Token(TokenError::WrongPurpose {
                expected: TokenPurpose::VerifyEmail,
                actual: TokenPurpose::ResetPassword,
            }))
        ));

        // the reset token is untouched
        assert!(f
            .tokens
            .verify(&token.value, TokenPurpose::ResetPassword)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_request_password_reset_mails_token() {
        let existing = user(UserStatus::Enabled, "password123");
        let user_id = existing.id;
        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_email()
            .returning(move |_| Ok(Some(existing.clone())));

        let mut notifications = MockTestNotificationPublisher::new();
        notifications
            .expect_publish_notification()
            .withf(|event| event.template == NotificationTemplate::ResetPassword)
            .times(1)
            .returning(|_| Ok(()));

        let f = fixture(users, notifications);
        f.service.request_password_reset(&email()).await.unwrap();

        let outstanding = f.tokens.revoke(&user_id, TokenPurpose::ResetPassword).await.unwrap();
        assert_eq!(outstanding, 1);
    }

    #[tokio::test]
    async fn test_request_password_reset_unknown_email() {
        let mut users = MockTestUserRepository::new();
        users.expect_find_by_email().returning(|_| Ok(None));
        let mut notifications = MockTestNotificationPublisher::new();
        notifications.expect_publish_notification().times(0);

        let f = fixture(users, notifications);
        assert!(matches!(
            f.service.request_password_reset(&email()).await,
            Err(AuthError::SubjectNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_reset_password_keeps_other_reset_tokens() {
        let existing = user(UserStatus::Enabled, "password123");
        let user_id = existing.id;
        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        users
            .expect_update()
            .withf(|user| CredentialHasher::new().verify("new-password-1", &user.password_hash).unwrap())
            .times(1)
            .returning(|user| Ok(user));

        let f = fixture(users, MockTestNotificationPublisher::new());
        let ttl = chrono::Duration::minutes(10);
        let used = f.tokens.issue(&user_id, TokenPurpose::ResetPassword, ttl).await.unwrap();
        let other = f.tokens.issue(&user_id, TokenPurpose::ResetPassword, ttl).await.unwrap();

        f.service
            .complete_reset_password(&used.value, "new-password-1")
            .await
            .unwrap();

        assert_eq!(
            f.tokens.verify(&used.value, TokenPurpose::ResetPassword).await,
            Err(TokenError::NotRecognized)
        );
        assert!(f
            .tokens
            .verify(&other.value, TokenPurpose::ResetPassword)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_change_password_evicts_cached_profile() {
        let existing = user(UserStatus::Enabled, "password123");
        let user_id = existing.id;
        let profile = UserProfile::from(&existing);
        let mut users = MockTestUserRepository::new();
        users
            .expect_find_by_id()
            .returning(move |_| Ok(Some(existing.clone())));
        users.expect_update().times(1).returning(|user| Ok(user));

        let f = fixture(users, MockTestNotificationPublisher::new());
        f.cache
            .put_profile(&profile, std::time::Duration::from_secs(60))
            .await;

        let wrong = f
            .service
            .change_password(
                &user_id,
                ChangePasswordCommand {
                    current_password: "not-my-password".to_string(),
                    new_password: "new-password-1".to_string(),
                },
            )
            .await;
        assert!(matches!(wrong, Err(AuthError::InvalidCredential)));
        assert!(f.cache.get_profile(&user_id).await.is_some());

        f.service
            .change_password(
                &user_id,
                ChangePasswordCommand {
                    current_password: "password123".to_string(),
                    new_password: "new-password-1".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(f.cache.get_profile(&user_id).await, None);
    }
}
