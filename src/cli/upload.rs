//! # upload 子命令 CLI 定义
//!
//! 递归上传目录中的所有文件到对象存储桶，对象键为相对路径，
//! 上传完成的源文件移入归档目录。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/upload.rs`

use clap::Args;
use std::path::PathBuf;

/// upload 子命令参数
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Folder to upload recursively
    #[arg(long, env = "DOCFLOW_INPUT_FOLDER")]
    pub input_folder: PathBuf,

    /// Folder to archive uploaded source files
    #[arg(long, env = "DOCFLOW_PROCESSED_FOLDER")]
    pub processed_folder: PathBuf,

    /// Folder to store the run log file
    #[arg(long, env = "DOCFLOW_LOG_FOLDER")]
    pub log_folder: PathBuf,

    /// Pre-authenticated bucket URL; object names are appended to it
    #[arg(long, env = "DOCFLOW_BUCKET_URL")]
    pub bucket_url: String,

    /// Upload attempts per file
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub attempts: u32,

    /// Upload even if the object already exists in the bucket
    #[arg(long, default_value_t = false)]
    pub overwrite: bool,

    /// Write a per-file CSV report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Disable the progress bar and per-file console output
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}
