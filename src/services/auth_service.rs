//! Authentication service - signup, login and token handling.
//!
//! Every flow that accepts an email passes it through the blacklist gate
//! first. A successful signup logs the user in immediately.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{BlacklistService, OtpService};
use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::password::DUMMY_HASH;
use crate::domain::{CreateUser, NewUser, Password, User};
use crate::errors::{AppError, AppResult};
use crate::infra::{CaptchaVerifier, UnitOfWork};
use crate::jobs::{NotificationJob, NotificationQueue};

/// JWT claims payload
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub exp: i64,
    pub iat: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account with a password and log it in.
    ///
    /// `captcha_token` is checked only when captcha verification is configured.
    async fn register(
        &self,
        input: CreateUser,
        captcha_token: Option<String>,
    ) -> AppResult<(User, TokenResponse)>;

    /// Create an account without a password and log it in.
    async fn signup_passwordless(&self, input: CreateUser) -> AppResult<(User, TokenResponse)>;

    /// Password login by username or email.
    async fn login(&self, identifier: String, password: String) -> AppResult<TokenResponse>;

    /// Complete an OTP login.
    async fn login_with_otp(
        &self,
        email: &str,
        session_id: &str,
        code: &str,
    ) -> AppResult<TokenResponse>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// Generate JWT token for a user
fn generate_token(user: &User, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        role: user.role.to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
    })
}

fn verify_token_internal(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    blacklist: Arc<dyn BlacklistService>,
    otp: Arc<dyn OtpService>,
    captcha: Option<Arc<dyn CaptchaVerifier>>,
    notifications: NotificationQueue,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(
        uow: Arc<U>,
        blacklist: Arc<dyn BlacklistService>,
        otp: Arc<dyn OtpService>,
        notifications: NotificationQueue,
        config: Config,
    ) -> Self {
        Self {
            uow,
            blacklist,
            otp,
            captcha: None,
            notifications,
            config,
        }
    }

    /// Require a valid captcha token on password signup.
    pub fn with_captcha(mut self, captcha: Arc<dyn CaptchaVerifier>) -> Self {
        self.captcha = Some(captcha);
        self
    }

    async fn verify_captcha(&self, token: Option<&str>) -> AppResult<()> {
        let Some(captcha) = &self.captcha else {
            return Ok(());
        };

        let token = token.unwrap_or_default();
        match captcha.verify(token).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(AppError::CaptchaFailed),
            Err(e) => {
                tracing::warn!(error = %e, "Captcha verification errored");
                Err(AppError::CaptchaFailed)
            }
        }
    }

    /// Shared signup path: validate, gate, check uniqueness, insert.
    async fn create_user(&self, input: CreateUser) -> AppResult<User> {
        input.validate()?;
        self.blacklist.check_email(&input.email).await?;

        let users = self.uow.users();
        if users.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::conflict("Username"));
        }
        if users.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::conflict("Email"));
        }

        let password = match &input.password {
            Some(plain) => Password::new(plain)?,
            None => Password::random()?,
        };

        let user = users
            .create(NewUser {
                username: input.username,
                email: input.email,
                password_hash: password.into_string(),
                name: input.name,
                phone_code: input.phone_code,
                phone_number: input.phone_number,
            })
            .await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn register(
        &self,
        input: CreateUser,
        captcha_token: Option<String>,
    ) -> AppResult<(User, TokenResponse)> {
        if input.password.is_none() {
            return Err(AppError::validation("Password is required"));
        }
        self.verify_captcha(captcha_token.as_deref()).await?;

        let user = self.create_user(input).await?;
        let token = generate_token(&user, &self.config)?;
        Ok((user, token))
    }

    async fn signup_passwordless(&self, mut input: CreateUser) -> AppResult<(User, TokenResponse)> {
        input.password = None;

        let user = self.create_user(input).await?;
        self.notifications
            .enqueue(NotificationJob::Identify { user: user.clone() });

        let token = generate_token(&user, &self.config)?;
        Ok((user, token))
    }

    async fn login(&self, identifier: String, password: String) -> AppResult<TokenResponse> {
        let users = self.uow.users();
        let user = if identifier.contains('@') {
            users.find_by_email(&identifier).await?
        } else {
            users.find_by_username(&identifier).await?
        };

        // Verify against a dummy hash for unknown users so both paths cost the same.
        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.to_string());
        let password_valid = Password::from_hash(hash).verify(&password);

        match user {
            Some(user) if password_valid => {
                tracing::info!(user_id = %user.id, "User logged in");
                generate_token(&user, &self.config)
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    async fn login_with_otp(
        &self,
        email: &str,
        session_id: &str,
        code: &str,
    ) -> AppResult<TokenResponse> {
        let user = self.otp.verify_otp(email, session_id, code).await?;
        generate_token(&user, &self.config)
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        verify_token_internal(token, &self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration as StdDuration;
    use tokio::sync::mpsc;

    use crate::domain::UserRole;
    use crate::infra::{InMemoryOtpStore, MockBlacklistRepository, MockUserRepository};
    use crate::services::test_support::{banning, test_config, test_user, TestUnitOfWork};
    use crate::services::{BlacklistManager, OtpManager};

    struct AlwaysCaptcha(bool);

    #[async_trait]
    impl CaptchaVerifier for AlwaysCaptcha {
        async fn verify(&self, _token: &str) -> AppResult<bool> {
            Ok(self.0)
        }
    }

    fn authenticator(
        users: MockUserRepository,
        blacklist: MockBlacklistRepository,
    ) -> (Authenticator<TestUnitOfWork>, mpsc::Receiver<NotificationJob>) {
        let uow = Arc::new(TestUnitOfWork::new(users, blacklist));
        let (queue, jobs) = NotificationQueue::new(16);
        let blacklist: Arc<dyn BlacklistService> = Arc::new(BlacklistManager::new(uow.clone()));
        let otp = Arc::new(OtpManager::new(
            uow.clone(),
            Arc::new(InMemoryOtpStore::new()),
            blacklist.clone(),
            queue.clone(),
            StdDuration::from_secs(300),
        ));
        let auth = Authenticator::new(uow, blacklist, otp, queue, test_config());
        (auth, jobs)
    }

    fn signup(password: Option<&str>) -> CreateUser {
        CreateUser {
            username: "jane_doe".to_string(),
            email: "jane@example.com".to_string(),
            password: password.map(str::to_string),
            name: "Jane Doe".to_string(),
            phone_code: None,
            phone_number: None,
        }
    }

    fn accepting_users() -> MockUserRepository {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users.expect_find_by_email().returning(|_| Ok(None));
        users.expect_create().returning(|new| {
            let mut user = test_user(&new.email);
            user.username = new.username;
            user.password_hash = new.password_hash;
            Ok(user)
        });
        users
    }

    #[tokio::test]
    async fn test_register_issues_token() {
        let (auth, _jobs) = authenticator(accepting_users(), banning(&[]));

        let (user, token) = auth
            .register(signup(Some("SecurePass123!")), None)
            .await
            .unwrap();

        assert_eq!(user.username, "jane_doe");
        let claims = auth.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(token.token_type, "Bearer");
    }

    #[tokio::test]
    async fn test_register_blocked_domain() {
        let mut users = MockUserRepository::new();
        users.expect_create().never();
        let (auth, _jobs) = authenticator(users, banning(&["spammy"]));

        let mut input = signup(Some("SecurePass123!"));
        input.email = "jane@mail.spammy.co".to_string();

        assert!(matches!(
            auth.register(input, None).await,
            Err(AppError::BlockedDomain)
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(test_user(email))));
        let (auth, _jobs) = authenticator(users, banning(&[]));

        assert!(matches!(
            auth.register(signup(Some("SecurePass123!")), None).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_register_captcha_rejected() {
        let mut users = MockUserRepository::new();
        users.expect_create().never();
        let (auth, _jobs) = authenticator(users, banning(&[]));
        let auth = auth.with_captcha(Arc::new(AlwaysCaptcha(false)));

        assert!(matches!(
            auth.register(signup(Some("SecurePass123!")), Some("token".into()))
                .await,
            Err(AppError::CaptchaFailed)
        ));
    }

    #[tokio::test]
    async fn test_passwordless_signup_queues_identify() {
        let (auth, mut jobs) = authenticator(accepting_users(), banning(&[]));

        let (user, _token) = auth.signup_passwordless(signup(None)).await.unwrap();

        assert!(user.password_hash.starts_with("$argon2"));
        match jobs.try_recv().unwrap() {
            NotificationJob::Identify { user: queued } => assert_eq!(queued.id, user.id),
            other => panic!("unexpected job: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let mut users = MockUserRepository::new();
        users.expect_find_by_username().returning(|_| Ok(None));
        let (auth, _jobs) = authenticator(users, banning(&[]));

        assert!(matches!(
            auth.login("ghost".into(), "whatever123".into()).await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_login_by_email() {
        let hash = Password::new("SecurePass123!").unwrap().into_string();
        let mut users = MockUserRepository::new();
        users.expect_find_by_email().returning(move |email| {
            let mut user = test_user(email);
            user.password_hash = hash.clone();
            user.role = UserRole::Admin;
            Ok(Some(user))
        });
        let (auth, _jobs) = authenticator(users, banning(&[]));

        let token = auth
            .login("jane@example.com".into(), "SecurePass123!".into())
            .await
            .unwrap();
        assert_eq!(auth.verify_token(&token.access_token).unwrap().role, "admin");

        assert!(matches!(
            auth.login("jane@example.com".into(), "wrong-password".into())
                .await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_otp_login_end_to_end() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_email()
            .returning(|email| Ok(Some(test_user(email))));
        let (auth, mut jobs) = authenticator(users, banning(&[]));

        let session_id = auth.otp.request_otp("jane@example.com").await.unwrap();
        let code = match jobs.try_recv().unwrap() {
            NotificationJob::SendOtp { code, .. } => code,
            other => panic!("unexpected job: {:?}", other),
        };

        let token = auth
            .login_with_otp("jane@example.com", &session_id.to_string(), code.as_str())
            .await
            .unwrap();
        assert!(auth.verify_token(&token.access_token).is_ok());
    }

    #[test]
    fn test_tampered_token_rejected() {
        let config = test_config();
        let token = generate_token(&test_user("jane@example.com"), &config).unwrap();

        let other = Config::new("another-secret-key-that-is-32-chars-long");

        assert!(verify_token_internal(&token.access_token, &config).is_ok());
        assert!(verify_token_internal(&token.access_token, &other).is_err());
    }
}
