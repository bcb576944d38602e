//! 错误处理单元测试
//!
//! 测试应用错误类型的状态码、对外消息和响应体

use axum::{http::StatusCode, response::IntoResponse};
use cms_auth::{
    auth::jwt::TokenError,
    error::{AppError, ErrorDetail, ErrorResponse},
};
use http_body_util::BodyExt;

// ==================== 错误状态码测试 ====================

#[test]
fn test_error_status_codes() {
    assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::InvalidRefreshToken.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::UserNotFound.status_code(), StatusCode::UNAUTHORIZED);
    assert_eq!(AppError::Forbidden.status_code(), StatusCode::FORBIDDEN);
    assert_eq!(AppError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
    assert_eq!(AppError::Validation("bad".to_string()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
}

#[test]
fn test_server_error_status_codes() {
    assert_eq!(
        AppError::Database(sqlx::Error::RowNotFound).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Config("missing".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        AppError::Internal("boom".to_string()).status_code(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[test]
fn test_error_code_matches_status() {
    let errors = vec![
        AppError::Unauthorized,
        AppError::Forbidden,
        AppError::DuplicateEmail,
        AppError::NotFound,
        AppError::Internal("x".to_string()),
    ];

    for error in errors {
        assert_eq!(error.code(), error.status_code().as_u16());
    }
}

// ==================== 用户消息测试 ====================

#[test]
fn test_user_messages_no_sensitive_info() {
    let db_error = AppError::Database(sqlx::Error::Protocol("users table password_hash".to_string()));
    assert_eq!(db_error.user_message(), "Database error occurred");

    let internal = AppError::Internal("secret key material".to_string());
    assert_eq!(internal.user_message(), "Internal server error");

    let config = AppError::Config("CMS_SECURITY__ACCESS_TOKEN_SECRET".to_string());
    assert_eq!(config.user_message(), "Configuration error");
}

#[test]
fn test_validation_message_is_passed_through() {
    let error = AppError::Validation("Password must be at least 6 characters".to_string());
    assert_eq!(error.user_message(), "Password must be at least 6 characters");
}

// ==================== 类型转换测试 ====================

#[test]
fn test_token_errors_map_to_unauthorized() {
    for token_error in [TokenError::InvalidSignature, TokenError::Expired, TokenError::Malformed] {
        let error: AppError = token_error.into();
        assert!(matches!(error, AppError::Unauthorized));
    }
}

#[test]
fn test_from_sqlx_error() {
    let error: AppError = sqlx::Error::RowNotFound.into();
    assert!(matches!(error, AppError::Database(_)));
}

#[test]
fn test_from_config_error() {
    let error: AppError = config::ConfigError::Message("bad value".to_string()).into();
    assert!(matches!(error, AppError::Config(_)));
}

// ==================== 响应体测试 ====================

#[test]
fn test_error_response_serialization() {
    let response = ErrorResponse {
        error: ErrorDetail {
            code: 409,
            message: "Email already registered".to_string(),
            request_id: "req-1".to_string(),
        },
    };

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["error"]["code"], 409);
    assert_eq!(json["error"]["message"], "Email already registered");
    assert_eq!(json["error"]["request_id"], "req-1");
}

#[tokio::test]
async fn test_into_response() {
    let response = AppError::InvalidCredentials.into_response();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["error"]["code"], 401);
    assert_eq!(json["error"]["message"], "Invalid credentials");
    assert!(json["error"]["request_id"].is_string());
}

#[test]
fn test_error_with_question_mark_operator() {
    fn lookup(found: bool) -> Result<i64, AppError> {
        let id: Option<i64> = found.then_some(7);
        let id = id.ok_or(AppError::NotFound)?;
        Ok(id)
    }

    assert_eq!(lookup(true).unwrap(), 7);
    assert!(matches!(lookup(false), Err(AppError::NotFound)));
}
