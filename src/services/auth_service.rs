//! 认证服务：注册、登录、令牌刷新、登出

use crate::{
    auth::{
        jwt::{JwtService, TokenClass, TokenPair},
        password::PasswordHasher,
    },
    config::SecurityConfig,
    error::AppError,
    models::{
        auth::{normalize_email, RegisterRequest},
        user::{NewUser, Role, User},
    },
    repository::CredentialStore,
};
use std::sync::Arc;
use validator::Validate;

/// Verified against when the email is unknown so both login failures cost the same.
const DUMMY_PASSWORD_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Result of a successful registration
#[derive(Debug, Clone)]
pub struct RegisteredSession {
    pub user: User,
    pub tokens: TokenPair,
}

/// Result of a successful refresh
#[derive(Debug, Clone)]
pub struct RefreshedAccess {
    pub access_token: String,
    pub expires_in: u64,
    pub user: User,
}

pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt_service: Arc<JwtService>,
    hasher: PasswordHasher,
    password_min_length: usize,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        jwt_service: Arc<JwtService>,
        config: &SecurityConfig,
    ) -> Self {
        Self {
            store,
            jwt_service,
            hasher: PasswordHasher::new(),
            password_min_length: config.password_min_length,
        }
    }

    pub fn with_hasher(mut self, hasher: PasswordHasher) -> Self {
        self.hasher = hasher;
        self
    }

    /// 用户注册；注册即登录，直接签发令牌对
    pub async fn register(&self, req: RegisterRequest) -> Result<RegisteredSession, AppError> {
        let req = req.normalized();
        req.validate()?;

        if req.password.chars().count() < self.password_min_length {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                self.password_min_length
            )));
        }

        if self.store.find_by_email(&req.email).await?.is_some() {
            tracing::debug!("Registration rejected: email already registered");
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.hash_password(req.password).await?;

        let new_user = NewUser {
            username: req.username,
            email: req.email,
            password_hash,
            role: Role::Standard,
        };
        let id = self.store.insert(&new_user).await?;

        let user = User {
            id,
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
        };

        tracing::info!(user_id = user.id, "User registered");
        metrics::counter!("auth_registrations_total").increment(1);

        let tokens = self.issue_session(&user)?;

        Ok(RegisteredSession { user, tokens })
    }

    /// 用户登录；邮箱不存在与密码错误返回同一错误
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let email = normalize_email(email);

        let user = self.store.find_by_email(&email).await?;

        let hash = user
            .as_ref()
            .map(|u| u.password_hash.clone())
            .unwrap_or_else(|| DUMMY_PASSWORD_HASH.to_string());
        let password_ok = self.verify_password(password.to_string(), hash).await?;

        let user = match user {
            Some(user) if password_ok => user,
            _ => {
                tracing::debug!("Login rejected");
                metrics::counter!("auth_login_total", "outcome" => "rejected").increment(1);
                return Err(AppError::InvalidCredentials);
            }
        };

        tracing::info!(user_id = user.id, "User logged in");
        metrics::counter!("auth_login_total", "outcome" => "success").increment(1);

        self.issue_session(&user)
    }

    /// 刷新访问令牌；按当前存储的角色签发，刷新令牌不轮换
    pub async fn refresh_access(&self, refresh_token: &str) -> Result<RefreshedAccess, AppError> {
        let claims = self
            .jwt_service
            .verify(refresh_token, TokenClass::Refresh)
            .map_err(|e| {
                tracing::debug!(error = %e, "Refresh token rejected");
                metrics::counter!("auth_refresh_rejected_total").increment(1);
                AppError::InvalidRefreshToken
            })?;

        let user = self
            .store
            .find_by_id(claims.user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if user.role != claims.role {
            tracing::debug!(
                user_id = user.id,
                claimed = %claims.role,
                current = %user.role,
                "Role changed since refresh token was issued"
            );
        }

        let access_token = self
            .jwt_service
            .issue(user.id, user.role, TokenClass::Access)?;

        Ok(RefreshedAccess {
            access_token,
            expires_in: self.jwt_service.ttl_secs(TokenClass::Access),
            user,
        })
    }

    /// 登出：服务端无会话状态，由客户端丢弃令牌（HTTP 层清除 Cookie）
    pub fn logout(&self) {
        tracing::debug!("Logout requested");
    }

    /// Look up a user by id
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        self.store.find_by_id(id).await
    }

    fn issue_session(&self, user: &User) -> Result<TokenPair, AppError> {
        self.jwt_service.issue_pair(user.id, user.role)
    }

    async fn hash_password(&self, password: String) -> Result<String, AppError> {
        let hasher = self.hasher.clone();
        let hash = tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))??;

        Ok(hash)
    }

    async fn verify_password(&self, password: String, hash: String) -> Result<bool, AppError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(format!("Password verification task failed: {}", e)))
    }
}
