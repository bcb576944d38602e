//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{auth::middleware as auth_middleware, handlers, middleware::AppState};

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    let jwt_service = state.jwt_service.clone();

    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 认证路由（无需令牌）
    let auth_routes = Router::new()
        .route("/api/register", post(handlers::auth::register))
        .route("/api/login", post(handlers::auth::login))
        .route("/api/refresh", post(handlers::auth::refresh_token))
        .route("/api/logout", post(handlers::auth::logout));

    // 可选认证：匿名可访问，携带的令牌必须有效
    let optional_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth::me))
        .layer(axum::middleware::from_fn_with_state(
            jwt_service.clone(),
            auth_middleware::optional_auth_middleware,
        ));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/api/users", get(handlers::user::list_users))
        .route("/api/users/{id}", get(handlers::user::get_user))
        .layer(axum::middleware::from_fn_with_state(
            jwt_service,
            auth_middleware::jwt_auth_middleware,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(optional_routes)
        .merge(authenticated_routes)
        .layer(axum::middleware::from_fn(crate::middleware::request_tracking_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
