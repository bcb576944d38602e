//! CMS 认证与会话核心
//! 令牌签发/校验、注册登录刷新、身份传递中间件与资源归属策略

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
