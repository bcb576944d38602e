//! JWT token generation and validation
//! Implements access token + refresh token pattern with one signing key per token class

use crate::{
    config::{SecurityConfig, ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS},
    error::AppError,
    models::user::Role,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum HS256 secret length in bytes
const MIN_SECRET_LEN: usize = 32;

/// Which key family signed a token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenClass {
    Access,
    Refresh,
}

/// JWT claims, decoded only by [`JwtService::verify`]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user ID)
    pub user_id: i64,

    /// Role at the moment of issuance
    pub role: Role,

    /// Token class the token was signed for
    pub token_class: TokenClass,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// Why a token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is malformed")]
    Malformed,
}

/// Every token failure surfaces to the caller as an authentication failure
impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        AppError::Unauthorized
    }
}

/// Token pair response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64, // seconds until access token expires
}

struct ClassKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: u64,
}

impl ClassKeys {
    fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }
}

/// JWT service
pub struct JwtService {
    access: ClassKeys,
    refresh: ClassKeys,
    validation: Validation,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, AppError> {
        Self::new(
            config.access_token_secret.expose_secret().as_bytes(),
            config.refresh_token_secret.expose_secret().as_bytes(),
            config.access_token_exp_secs,
            config.refresh_token_exp_secs,
        )
    }

    pub fn new(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_token_exp_secs: u64,
        refresh_token_exp_secs: u64,
    ) -> Result<Self, AppError> {
        // Ensure secrets are at least 32 bytes for HS256
        if access_secret.len() < MIN_SECRET_LEN || refresh_secret.len() < MIN_SECRET_LEN {
            return Err(AppError::Config(
                "Token secret too short (min 32 chars)".to_string(),
            ));
        }
        if access_secret == refresh_secret {
            return Err(AppError::Config(
                "Access and refresh tokens must use different secrets".to_string(),
            ));
        }

        if !ACCESS_TOKEN_TTL_SECS.contains(&access_token_exp_secs) {
            return Err(AppError::Config(format!(
                "Access token lifetime must be within {:?} seconds",
                ACCESS_TOKEN_TTL_SECS
            )));
        }
        if !REFRESH_TOKEN_TTL_SECS.contains(&refresh_token_exp_secs) {
            return Err(AppError::Config(format!(
                "Refresh token lifetime must be within {:?} seconds",
                REFRESH_TOKEN_TTL_SECS
            )));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            access: ClassKeys::new(access_secret, access_token_exp_secs),
            refresh: ClassKeys::new(refresh_secret, refresh_token_exp_secs),
            validation,
        })
    }

    fn keys(&self, class: TokenClass) -> &ClassKeys {
        match class {
            TokenClass::Access => &self.access,
            TokenClass::Refresh => &self.refresh,
        }
    }

    /// Lifetime of tokens of the given class, in seconds
    pub fn ttl_secs(&self, class: TokenClass) -> u64 {
        self.keys(class).ttl_secs
    }

    /// Issue a token of the given class, valid from now
    pub fn issue(&self, user_id: i64, role: Role, class: TokenClass) -> Result<String, AppError> {
        self.issue_at(user_id, role, class, Utc::now())
    }

    /// Issue a token as if it had been minted at `issued_at`
    pub fn issue_at(
        &self,
        user_id: i64,
        role: Role,
        class: TokenClass,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let keys = self.keys(class);
        let expiration = i64::try_from(keys.ttl_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::Internal(format!("{:?} token expiry out of range", class))
            })?;

        let claims = Claims {
            user_id,
            role,
            token_class: class,
            iat: issued_at.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).map_err(|e| {
            tracing::error!(?class, "Failed to encode token: {:?}", e);
            AppError::Internal(format!("Failed to encode {:?} token: {}", class, e))
        })
    }

    /// Generate token pair
    pub fn issue_pair(&self, user_id: i64, role: Role) -> Result<TokenPair, AppError> {
        let access_token = self.issue(user_id, role, TokenClass::Access)?;
        let refresh_token = self.issue(user_id, role, TokenClass::Refresh)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            expires_in: self.access.ttl_secs,
        })
    }

    /// Validate and decode a token against the key of `class`.
    ///
    /// The signature is checked before expiry, so a token signed with the
    /// other class's key is always `InvalidSignature`.
    pub fn verify(&self, token: &str, class: TokenClass) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.keys(class).decoding, &self.validation)
            .map_err(|e| {
                tracing::debug!(?class, "Token validation failed: {:?}", e);
                match e.kind() {
                    ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                    ErrorKind::ExpiredSignature => TokenError::Expired,
                    _ => TokenError::Malformed,
                }
            })?
            .claims;

        if claims.token_class != class {
            tracing::debug!(
                expected = ?class,
                actual = ?claims.token_class,
                "Token class mismatch"
            );
            return Err(TokenError::InvalidSignature);
        }

        Ok(claims)
    }
}
