//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use std::ops::RangeInclusive;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Secret<String>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// 访问令牌签名密钥
    pub access_token_secret: Secret<String>,
    /// 刷新令牌签名密钥，必须与访问令牌密钥不同
    pub refresh_token_secret: Secret<String>,
    /// 访问令牌过期时间（秒）
    pub access_token_exp_secs: u64,
    /// 刷新令牌过期时间（秒）
    pub refresh_token_exp_secs: u64,
    /// 密码最小长度
    pub password_min_length: usize,
    /// 令牌 Cookie 是否带 Secure 标记（仅 HTTPS 部署时开启）
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

/// 访问令牌有效期范围（秒）：1 分钟到 24 小时
pub const ACCESS_TOKEN_TTL_SECS: RangeInclusive<u64> = 60..=86400;
/// 刷新令牌有效期范围（秒）：1 小时到 30 天
pub const REFRESH_TOKEN_TTL_SECS: RangeInclusive<u64> = 3600..=2592000;

/// 开发用默认密钥，生产环境必须通过环境变量覆盖
const DEV_ACCESS_TOKEN_SECRET: &str = "change-this-access-secret-in-production-32+";
const DEV_REFRESH_TOKEN_SECRET: &str = "change-this-refresh-secret-in-production-32+";

impl SecurityConfig {
    /// 是否仍在使用内置的开发密钥
    pub fn uses_dev_secrets(&self) -> bool {
        self.access_token_secret.expose_secret() == DEV_ACCESS_TOKEN_SECRET
            || self.refresh_token_secret.expose_secret() == DEV_REFRESH_TOKEN_SECRET
    }
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("database.url", "sqlite://cms.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.access_token_secret", DEV_ACCESS_TOKEN_SECRET)?
            .set_default("security.refresh_token_secret", DEV_REFRESH_TOKEN_SECRET)?
            .set_default("security.access_token_exp_secs", 900)?
            .set_default("security.refresh_token_exp_secs", 604800)?
            .set_default("security.password_min_length", 6)?
            .set_default("security.cookie_secure", false)?;

        // 从环境变量加载配置（前缀为 CMS_）
        settings = settings.add_source(
            Environment::with_prefix("CMS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证数据库连接池配置
        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        // 验证签名密钥：长度至少 32 字符，两类令牌密钥必须不同
        let access_secret = self.security.access_token_secret.expose_secret();
        let refresh_secret = self.security.refresh_token_secret.expose_secret();
        if access_secret.len() < 32 || refresh_secret.len() < 32 {
            return Err(ConfigError::Message(
                "Token secrets must be at least 32 characters long".to_string(),
            ));
        }
        if access_secret == refresh_secret {
            return Err(ConfigError::Message(
                "access_token_secret and refresh_token_secret must differ".to_string(),
            ));
        }

        // 验证令牌过期时间
        if !ACCESS_TOKEN_TTL_SECS.contains(&self.security.access_token_exp_secs) {
            return Err(ConfigError::Message(
                "access_token_exp_secs must be between 60 and 86400 (1 minute to 24 hours)"
                    .to_string(),
            ));
        }

        if !REFRESH_TOKEN_TTL_SECS.contains(&self.security.refresh_token_exp_secs) {
            return Err(ConfigError::Message(
                "refresh_token_exp_secs must be between 3600 and 2592000 (1 hour to 30 days)"
                    .to_string(),
            ));
        }

        if self.security.refresh_token_exp_secs <= self.security.access_token_exp_secs {
            return Err(ConfigError::Message(
                "refresh_token_exp_secs must be longer than access_token_exp_secs".to_string(),
            ));
        }

        // 验证密码策略
        if self.security.password_min_length < 4 || self.security.password_min_length > 128 {
            return Err(ConfigError::Message(
                "password_min_length must be between 4 and 128".to_string(),
            ));
        }

        Ok(())
    }
}
