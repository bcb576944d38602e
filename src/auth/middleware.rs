//! JWT 认证中间件
//!
//! Token lookup order: `Authorization: Bearer` header, then the `access_token` cookie.
//! The verified identity is attached as a typed request extension and read by
//! handlers through the [`Identity`] / [`MaybeIdentity`] extractors.

use crate::{
    auth::{
        cookie::{extract_cookie, ACCESS_TOKEN_COOKIE},
        jwt::{Claims, JwtService, TokenClass},
        policy,
    },
    error::AppError,
    models::user::Role,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;
use std::sync::Arc;

/// 认证身份（附加到请求扩展）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            role: claims.role,
        }
    }
}

impl Identity {
    pub fn can_access(&self, resource_owner_id: i64) -> bool {
        policy::can_access(self.user_id, self.role, resource_owner_id)
    }

    pub fn ensure_can_access(&self, resource_owner_id: i64) -> Result<(), AppError> {
        policy::ensure_can_access(self.user_id, self.role, resource_owner_id)
    }
}

/// Identity for routes where authentication is optional
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaybeIdentity(pub Option<Identity>);

// 实现 FromRequestParts 以便在 handler 中直接提取 Identity
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .copied()
            .ok_or(AppError::Unauthorized)
    }
}

impl<S> FromRequestParts<S> for MaybeIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeIdentity(parts.extensions.get::<Identity>().copied()))
    }
}

/// Whether a route accepts anonymous requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Optional,
    Required,
}

/// 提取令牌：Authorization 头优先，Cookie 兜底
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    match bearer {
        Some(token) => Some(token.to_string()),
        None => extract_cookie(headers, ACCESS_TOKEN_COOKIE).filter(|token| !token.is_empty()),
    }
}

/// Resolve the request identity.
///
/// A missing token is only an error in `Required` mode; a token that is
/// present but fails verification is rejected in both modes.
pub fn authenticate(
    jwt_service: &JwtService,
    headers: &HeaderMap,
    mode: AuthMode,
) -> Result<Option<Identity>, AppError> {
    let Some(token) = extract_token(headers) else {
        return match mode {
            AuthMode::Required => Err(AppError::Unauthorized),
            AuthMode::Optional => Ok(None),
        };
    };

    let claims = jwt_service.verify(&token, TokenClass::Access)?;

    Ok(Some(Identity::from(claims)))
}

/// JWT 认证中间件 - 必须认证
pub async fn jwt_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(identity) = authenticate(&jwt_service, req.headers(), AuthMode::Required)? {
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

/// 可选认证 - 无令牌按匿名处理，令牌无效则拒绝
pub async fn optional_auth_middleware(
    State(jwt_service): State<Arc<JwtService>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(identity) = authenticate(&jwt_service, req.headers(), AuthMode::Optional)? {
        req.extensions_mut().insert(identity);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn jwt_service() -> JwtService {
        JwtService::new(
            b"test_access_secret_32_characters_long!",
            b"test_refresh_secret_32_characters_long",
            900,
            604800,
        )
        .unwrap()
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_extract_token_from_header() {
        let headers = bearer("test_token_123");
        assert_eq!(extract_token(&headers), Some("test_token_123".to_string()));
    }

    #[test]
    fn test_extract_token_cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwdw==".parse().unwrap());
        headers.insert(header::COOKIE, "access_token=from_cookie".parse().unwrap());

        assert_eq!(extract_token(&headers), Some("from_cookie".to_string()));
    }

    #[test]
    fn test_extract_token_header_wins_over_cookie() {
        let mut headers = bearer("from_header");
        headers.insert(header::COOKIE, "access_token=from_cookie".parse().unwrap());

        assert_eq!(extract_token(&headers), Some("from_header".to_string()));
    }

    #[test]
    fn test_extract_token_missing() {
        assert_eq!(extract_token(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(extract_token(&headers), None);
    }

    #[test]
    fn test_authenticate_optional_without_token() {
        let service = jwt_service();
        let identity = authenticate(&service, &HeaderMap::new(), AuthMode::Optional).unwrap();
        assert_eq!(identity, None);
    }

    #[test]
    fn test_authenticate_required_without_token() {
        let service = jwt_service();
        let result = authenticate(&service, &HeaderMap::new(), AuthMode::Required);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_authenticate_rejects_garbage_token_in_both_modes() {
        let service = jwt_service();
        let headers = bearer("garbage");

        assert!(matches!(
            authenticate(&service, &headers, AuthMode::Optional),
            Err(AppError::Unauthorized)
        ));
        assert!(matches!(
            authenticate(&service, &headers, AuthMode::Required),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_authenticate_rejects_refresh_token() {
        let service = jwt_service();
        let refresh = service.issue(3, Role::Standard, TokenClass::Refresh).unwrap();

        let result = authenticate(&service, &bearer(&refresh), AuthMode::Required);
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_authenticate_valid_access_token() {
        let service = jwt_service();
        let access = service.issue(3, Role::Admin, TokenClass::Access).unwrap();

        let identity = authenticate(&service, &bearer(&access), AuthMode::Required)
            .unwrap()
            .unwrap();
        assert_eq!(identity, Identity { user_id: 3, role: Role::Admin });
        assert!(identity.can_access(99));
    }

    #[test]
    fn test_identity_ownership_checks() {
        let owner = Identity { user_id: 5, role: Role::Standard };
        assert!(owner.ensure_can_access(5).is_ok());
        assert!(matches!(owner.ensure_can_access(99), Err(AppError::Forbidden)));

        let admin = Identity { user_id: 5, role: Role::Admin };
        assert!(admin.ensure_can_access(99).is_ok());
    }
}
