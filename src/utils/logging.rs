//! # 运行日志
//!
//! 每次运行在日志目录下新建 `process_%Y-%m-%d_%H-%M-%S.log`，
//! 以追加方式写入 `tracing` 事件，每行包含时间、级别和消息。
//!
//! ## 依赖关系
//! - 被 `commands/` 在处理开始前初始化
//! - 使用 `tracing-subscriber` 的 fmt 层，`chrono` 生成文件名

use crate::error::{DocflowError, Result};

use chrono::{DateTime, Local};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::Subscriber;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// 运行日志文件名
pub fn log_file_name(started: DateTime<Local>) -> String {
    started.format("process_%Y-%m-%d_%H-%M-%S.log").to_string()
}

/// 在日志目录中打开本次运行的日志文件
pub fn open_run_log(log_dir: &Path) -> Result<(File, PathBuf)> {
    let path = log_dir.join(log_file_name(Local::now()));
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| DocflowError::RunLogError {
            path: path.clone(),
            source: e,
        })?;
    Ok((file, path))
}

/// 写入运行日志文件的 subscriber
pub fn run_log_subscriber(file: File, filter: EnvFilter) -> impl Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S%.3f".to_string()))
        .finish()
}

/// 初始化全局运行日志，返回日志文件路径
///
/// 默认级别 `info`，可用 `RUST_LOG` 覆盖。
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    let (file, path) = open_run_log(log_dir)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing::subscriber::set_global_default(run_log_subscriber(file, filter)).map_err(|e| {
        DocflowError::InvalidArgument(format!("run log already initialised: {}", e))
    })?;

    Ok(path)
}
