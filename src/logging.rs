//! tracing 订阅器初始化
//!
//! 标准输出始终开启；`Config::log_dir` 存在时额外写入按天滚动的日志文件。

use std::path::Path;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "danci-vocab.log";
const FALLBACK_FILTER: &str = "info";

/// 文件日志写入线程的守卫，释放时刷新缓冲
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// 安装全局 tracing subscriber
///
/// 已有全局 subscriber（宿主程序或重复调用）时不做任何事并返回 `None`。
/// 无法解析的过滤表达式退回 `info`，日志目录不可用时只输出到标准输出。
pub fn init_tracing(config: &Config) -> Option<FileLogGuard> {
    let env_filter =
        EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));

    let (file_writer, guard) = match config.log_dir.as_deref().and_then(open_log_file) {
        Some((writer, guard)) => (Some(writer), Some(guard)),
        None => (None, None),
    };
    let file_layer = file_writer.map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
    });

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .is_ok();

    if !installed {
        return None;
    }
    guard.map(|guard| FileLogGuard { _guard: guard })
}

fn open_log_file(dir: &Path) -> Option<(NonBlocking, WorkerGuard)> {
    if let Err(err) = std::fs::create_dir_all(dir) {
        eprintln!("failed to create log directory {}: {err}", dir.display());
        return None;
    }

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .build(dir);

    match appender {
        Ok(appender) => Some(tracing_appender::non_blocking(appender)),
        Err(err) => {
            eprintln!("failed to open log directory {}: {err}", dir.display());
            None
        }
    }
}
