//! # 统一错误处理模块
//!
//! 定义 docflow 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分层
//! - [`DocflowError`]: 致命错误，在处理任何文件之前中止运行（配置、根目录不可用）
//! - [`HandlerError`]: 外部协作者（转换器、上传器）的单文件失败
//! - [`StorageError`]: 文件系统或远端存储的单文件失败
//!
//! 单文件错误不会越过流水线边界，最终被记录为 `models::TaskFailure`。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use std::path::PathBuf;
use thiserror::Error;

/// docflow 致命错误类型
#[derive(Error, Debug)]
pub enum DocflowError {
    // ─────────────────────────────────────────────────────────────
    // 配置错误
    // ─────────────────────────────────────────────────────────────
    #[error("Input folder not found: {path}")]
    InputNotFound { path: PathBuf },

    #[error("Input path is not a directory: {path}")]
    InputNotDirectory { path: PathBuf },

    #[error("Cannot create {role} folder: {path}")]
    RootUncreatable {
        role: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("The {role} folder '{path}' lies inside the input folder and would be re-processed")]
    RootInsideInput { role: &'static str, path: PathBuf },

    #[error("Invalid bucket URL '{url}': {reason}")]
    InvalidBucketUrl { url: String, reason: String },

    #[error("Bucket on '{host}' is not accessible: {reason}")]
    BucketUnavailable { host: String, reason: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 运行日志 / 报告
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to open run log: {path}")]
    RunLogError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // HTTP 客户端
    // ─────────────────────────────────────────────────────────────
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, DocflowError>;

/// 外部协作者返回的失败
///
/// `Transient` 允许按类别配置重试；`Permanent` 立即终止重试。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("{0}")]
    Transient(String),

    #[error("{0}")]
    Permanent(String),
}

impl HandlerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, HandlerError::Transient(_))
    }
}

/// 存储层错误（本地目录树、归档、远端桶）
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Cannot create directory: {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {from} -> {to}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from} -> {to}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to inspect {path}")]
    Inspect {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Remote request for '{key}' failed: {reason}")]
    Remote { key: String, reason: String },
}

impl StorageError {
    /// 带上 `source` 链的完整描述，写入日志用
    pub fn detail(&self) -> String {
        use std::error::Error as _;
        match self.source() {
            Some(source) => format!("{}: {}", self, source),
            None => self.to_string(),
        }
    }
}
