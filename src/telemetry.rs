//! 日志系统
//! 按配置安装 EnvFilter + json/pretty 输出层

use crate::config::LoggingConfig;
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// 依赖库的默认日志级别，避免 sqlx 逐条打印查询
const DEPENDENCY_DIRECTIVES: &[&str] = &["sqlx=warn", "tower_http=info", "hyper=warn"];

/// 构建过滤器：RUST_LOG 优先，否则使用配置级别
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = vec![format!("cms_auth={}", config.level), config.level.clone()];
    directives.extend(DEPENDENCY_DIRECTIVES.iter().map(|d| d.to_string()));

    EnvFilter::new(directives.join(","))
}

/// 初始化日志；重复初始化返回错误而不是 panic
pub fn init_telemetry(config: &LoggingConfig) -> anyhow::Result<()> {
    let log_layer = match config.format.to_lowercase().as_str() {
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(false)
            .boxed(),
        // 生产环境默认 JSON，请求 span 关闭时输出耗时
        _ => tracing_subscriber::fmt::layer()
            .json()
            .with_target(false)
            .with_current_span(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(log_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!(
        service = env!("CARGO_PKG_NAME"),
        level = %config.level,
        format = %config.format,
        "Logging initialized"
    );

    Ok(())
}
