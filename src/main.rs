//! CMS 认证服务主入口

use cms_auth::{config::AppConfig, db, handlers::health, middleware::AppState, routes, telemetry};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("cms-auth {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            "--check-config" => {
                load_env_files();
                return match AppConfig::from_env() {
                    Ok(config) => {
                        println!(
                            "配置有效: addr={} access_ttl={}s refresh_ttl={}s",
                            config.server.addr,
                            config.security.access_token_exp_secs,
                            config.security.refresh_token_exp_secs
                        );
                        Ok(())
                    }
                    Err(e) => {
                        eprintln!("配置无效: {}", e);
                        std::process::exit(2);
                    }
                };
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    load_env_files();

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::from_env().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "CMS auth service starting...");

    if config.security.uses_dev_secrets() {
        tracing::warn!("Using built-in development token secrets; set CMS_SECURITY__ACCESS_TOKEN_SECRET and CMS_SECURITY__REFRESH_TOKEN_SECRET");
    }

    // 3. 数据库连接池 + 迁移
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    // 4. 构建应用状态（签名密钥从配置注入）
    let app_state = Arc::new(AppState::build(config.clone(), db_pool)?);

    // 5. 构建路由
    let app = routes::create_router(app_state);

    // 6. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    // 7. 优雅关闭
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.graceful_shutdown_timeout_secs))
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 加载 .env 文件（开发环境）
/// CMS_ENV 指定时只加载 .env.{CMS_ENV}，否则按 .env.local > .env.development > .env
fn load_env_files() {
    if let Ok(env) = std::env::var("CMS_ENV") {
        dotenv::from_filename(format!(".env.{}", env)).ok();
    } else {
        dotenv::from_filename(".env.local").ok();
        dotenv::from_filename(".env.development").ok();
        dotenv::dotenv().ok();
    }
}

/// 优雅关闭信号处理
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }

    // 超时后强制退出
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(timeout_secs)).await;
        tracing::warn!("Graceful shutdown timeout reached, forcing exit");
        std::process::exit(1);
    });
}

/// 打印帮助信息
fn print_help() {
    println!("cms-auth {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: cms-auth [选项]");
    println!();
    println!("选项:");
    println!("  --version     打印版本信息并退出");
    println!("  --help        打印此帮助信息并退出");
    println!("  --check-config  校验配置（含签名密钥）后退出");
    println!();
    println!("环境变量:");
    println!("  所有配置通过 CMS_ 前缀的环境变量完成，例如:");
    println!("  CMS_DATABASE__URL=sqlite://cms.db?mode=rwc");
    println!("  CMS_SECURITY__ACCESS_TOKEN_SECRET / CMS_SECURITY__REFRESH_TOKEN_SECRET");
}
