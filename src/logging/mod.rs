//! 日志初始化.
//!
//! 双通道输出: 控制台 (带颜色, 固定 debug 级别) 与按天滚动的日志文件
//! (级别来自配置). 文件写入经 tracing-appender 的非阻塞通道, 进程退出
//! 前由全局 guard 保证落盘.
//!
//! 库 crate 内部使用 `log` 门面记录, 由订阅器的 log 桥接统一收集;
//! 嵌入方不调用 [`init`] 时日志静默, 不影响会话功能.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

/// 日志配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 文件通道的级别过滤 (EnvFilter 语法, 如 "info" 或 "xun_codec=debug")
    pub level: String,
    /// 日志目录
    pub directory: String,
    /// 日志文件名前缀
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: "logs".to_string(),
            file_prefix: "xun".to_string(),
        }
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// 初始化全局日志订阅器
///
/// 进程内只能调用一次; 重复调用会因全局订阅器已设置而失败.
pub fn init(config: LoggingConfig) -> Result<()> {
    std::fs::create_dir_all(&config.directory)
        .with_context(|| format!("创建日志目录失败, directory={}", config.directory))?;

    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD.set(guard).ok();

    let console_layer = fmt::Layer::default()
        .with_writer(std::io::stdout)
        .with_ansi(true)
        .with_filter(EnvFilter::new("debug"));

    let file_layer = fmt::Layer::default()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_filter(EnvFilter::new(&config.level));

    Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("全局日志订阅器已初始化")?;

    tracing::info!(
        "日志系统已初始化: directory={}, 文件级别={}",
        config.directory,
        config.level
    );
    Ok(())
}
