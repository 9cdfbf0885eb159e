//! # convert 子命令 CLI 定义
//!
//! 批量转换 Office 文档 (.doc/.docx, .xls/.xlsx, .ppt/.pptx) 为 PDF，
//! 其他文件原样复制，处理完的源文件移入归档目录。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/convert.rs`

use clap::Args;
use std::path::PathBuf;

/// convert 子命令参数
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Folder to scan recursively for documents
    #[arg(long, env = "DOCFLOW_INPUT_FOLDER")]
    pub input_folder: PathBuf,

    /// Folder receiving the PDFs (mirrors the input structure)
    #[arg(long, env = "DOCFLOW_OUTPUT_FOLDER")]
    pub output_folder: PathBuf,

    /// Folder to archive processed source files
    #[arg(long, env = "DOCFLOW_PROCESSED_FOLDER")]
    pub processed_folder: PathBuf,

    /// Folder to store the run log file
    #[arg(long, env = "DOCFLOW_LOG_FOLDER")]
    pub log_folder: PathBuf,

    /// LibreOffice executable used for conversion
    #[arg(long, env = "DOCFLOW_SOFFICE", default_value = "soffice")]
    pub soffice: PathBuf,

    /// Conversion attempts for Word documents
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..))]
    pub word_attempts: u32,

    /// Conversion attempts for Excel workbooks
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub excel_attempts: u32,

    /// Conversion attempts for PowerPoint presentations
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub powerpoint_attempts: u32,

    /// Kill a conversion that runs longer than this many seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Write a per-file CSV report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Disable the progress bar and per-file console output
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}
