//! Authentication-related models

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::user::{Role, UserResponse};

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64, message = "Username must be 1-64 characters"))]
    pub username: String,
    #[validate(email(message = "Email address is invalid"))]
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Trim the username and canonicalize the email before validation
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
        }
    }
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Token refresh request (the refresh cookie is used when no body is sent)
#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Registration response
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
}

/// Token refresh response
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub user: UserResponse,
}

/// Identity seen by the optional-auth endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_normalization() {
        let req = RegisterRequest {
            username: "  alice ".to_string(),
            email: " Alice@Example.COM ".to_string(),
            password: "pw123".to_string(),
        }
        .normalized();

        assert_eq!(req.username, "alice");
        assert_eq!(req.email, "alice@example.com");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_register_request_validation() {
        let blank_name = RegisterRequest {
            username: "   ".to_string(),
            email: "a@x.com".to_string(),
            password: "pw123".to_string(),
        }
        .normalized();
        assert!(blank_name.validate().is_err());

        let bad_email = RegisterRequest {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "pw123".to_string(),
        };
        assert!(bad_email.validate().is_err());
    }
}
