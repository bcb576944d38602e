//! 认证相关的 HTTP 处理器

use crate::{
    auth::{
        cookie::{expired_cookie, extract_cookie, token_cookie, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE},
        jwt::TokenPair,
        middleware::MaybeIdentity,
    },
    config::SecurityConfig,
    error::AppError,
    middleware::AppState,
    models::{auth::*, user::UserResponse},
};
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 注册（注册即登录）
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Malformed registration body");
        AppError::Validation(rejection.body_text())
    })?;

    let session = state.auth_service.register(req).await?;

    let cookies = session_cookies(&state.config.security, &session.tokens);

    Ok((
        StatusCode::CREATED,
        AppendHeaders(cookies),
        Json(RegisterResponse {
            user: UserResponse::from(session.user),
            access_token: session.tokens.access_token,
            refresh_token: session.tokens.refresh_token,
            expires_in: session.tokens.expires_in,
        }),
    ))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    // 请求体无法解析时与凭证错误返回同一响应
    let Json(req) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Malformed login body");
        AppError::InvalidCredentials
    })?;

    let tokens = state.auth_service.login(&req.email, &req.password).await?;

    let cookies = session_cookies(&state.config.security, &tokens);

    Ok((AppendHeaders(cookies), Json(tokens)))
}

/// 刷新访问令牌
/// 令牌来自 JSON 请求体，缺省时读取 refresh_token Cookie
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let token = refresh_token_from_request(&headers, &body).ok_or(AppError::InvalidRefreshToken)?;

    let refreshed = state.auth_service.refresh_access(&token).await?;

    let cookie = token_cookie(
        ACCESS_TOKEN_COOKIE,
        &refreshed.access_token,
        refreshed.expires_in,
        state.config.security.cookie_secure,
    );

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(RefreshResponse {
            access_token: refreshed.access_token,
            expires_in: refreshed.expires_in,
            user: UserResponse::from(refreshed.user),
        }),
    ))
}

/// 登出：清除两个令牌 Cookie
pub async fn logout(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.auth_service.logout();

    (
        AppendHeaders([
            (header::SET_COOKIE, expired_cookie(ACCESS_TOKEN_COOKIE)),
            (header::SET_COOKIE, expired_cookie(REFRESH_TOKEN_COOKIE)),
        ]),
        Json(json!({"status": "logged out"})),
    )
}

/// 当前身份（可选认证）
pub async fn me(MaybeIdentity(identity): MaybeIdentity) -> Json<MeResponse> {
    Json(MeResponse {
        authenticated: identity.is_some(),
        user_id: identity.map(|i| i.user_id),
        role: identity.map(|i| i.role),
    })
}

fn session_cookies(config: &SecurityConfig, tokens: &TokenPair) -> [(HeaderName, String); 2] {
    [
        (
            header::SET_COOKIE,
            token_cookie(
                ACCESS_TOKEN_COOKIE,
                &tokens.access_token,
                config.access_token_exp_secs,
                config.cookie_secure,
            ),
        ),
        (
            header::SET_COOKIE,
            token_cookie(
                REFRESH_TOKEN_COOKIE,
                &tokens.refresh_token,
                config.refresh_token_exp_secs,
                config.cookie_secure,
            ),
        ),
    ]
}

fn refresh_token_from_request(headers: &HeaderMap, body: &[u8]) -> Option<String> {
    if !body.is_empty() {
        if let Ok(req) = serde_json::from_slice::<RefreshTokenRequest>(body) {
            if !req.refresh_token.is_empty() {
                return Some(req.refresh_token);
            }
        }
    }

    extract_cookie(headers, REFRESH_TOKEN_COOKIE).filter(|token| !token.is_empty())
}
