//! 测试公共模块
//! 提供测试辅助函数和测试工具

#![allow(dead_code)]

use axum::{body::Body, http::Response};
use cms_auth::{
    auth::password::PasswordHasher,
    config::{AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig},
    db,
    middleware::AppState,
    models::user::Role,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use sqlx::SqlitePool;
use std::sync::Arc;

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(), // 使用随机端口
            graceful_shutdown_timeout_secs: 5,
        },
        database: DatabaseConfig {
            // 单连接保证内存库在整个测试期间共享
            url: Secret::new("sqlite::memory:".to_string()),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            access_token_secret: Secret::new(
                "test-access-secret-for-testing-only-min-32-chars".to_string(),
            ),
            refresh_token_secret: Secret::new(
                "test-refresh-secret-for-testing-only-min-32-chars".to_string(),
            ),
            access_token_exp_secs: 300,   // 5分钟用于测试
            refresh_token_exp_secs: 3600, // 1小时用于测试
            password_min_length: 5,
            cookie_secure: false,
        },
    }
}

/// 初始化测试数据库
pub async fn setup_test_db(config: &AppConfig) -> SqlitePool {
    let pool = db::create_pool(&config.database)
        .await
        .expect("Failed to create test database pool");

    db::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// 创建测试应用状态
pub async fn create_test_app_state(pool: SqlitePool) -> Arc<AppState> {
    let config = create_test_config();
    Arc::new(AppState::build(config, pool).expect("Failed to build app state"))
}

/// 直接写库创建测试用户
pub async fn create_test_user(
    pool: &SqlitePool,
    username: &str,
    password: &str,
    email: &str,
    role: Role,
) -> Result<i64, Box<dyn std::error::Error>> {
    let hasher = PasswordHasher::new();
    let password_hash = hasher.hash(password)?;

    let result = sqlx::query(
        "INSERT INTO users (username, email, password_hash, role) VALUES (?, ?, ?, ?)",
    )
    .bind(username)
    .bind(email)
    .bind(&password_hash)
    .bind(role)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// 修改用户角色（模拟后台提权）
pub async fn set_user_role(pool: &SqlitePool, user_id: i64, role: Role) {
    sqlx::query("UPDATE users SET role = ? WHERE id = ?")
        .bind(role)
        .bind(user_id)
        .execute(pool)
        .await
        .expect("Failed to update role");
}

/// 读取 JSON 响应体
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// 收集所有 Set-Cookie 头
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .collect()
}
