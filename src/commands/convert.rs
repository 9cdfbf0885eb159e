//! # convert 命令实现
//!
//! 批量转换 Office 文档为 PDF。
//!
//! ## 功能
//! - 校验输入/输出/归档/日志目录
//! - 每个类别注册一个 LibreOffice 转换器，按类别配置尝试次数
//! - 其他文件原样复制到输出目录
//! - 处理完成的源文件移入归档目录，失败的保留在原处
//!
//! ## 依赖关系
//! - 使用 `cli/convert.rs` 定义的参数
//! - 使用 `batch/`, `handlers/office.rs`, `storage/local.rs`
//! - 使用 `utils/output.rs`, `utils/logging.rs`

use super::summarize;
use crate::batch::{BatchRunner, FileCollector, RunReport};
use crate::cli::convert::ConvertArgs;
use crate::config::PipelineConfig;
use crate::error::{DocflowError, Result};
use crate::handlers::{OfficeConverter, RetryPolicy};
use crate::models::Category;
use crate::storage::{Archiver, LocalTree};
use crate::utils::{logging, output};

use std::time::Duration;
use tracing::info;

/// 执行 convert 命令
pub fn execute(args: ConvertArgs) -> Result<RunReport> {
    output::print_header("Converting office documents to PDF");

    let config = PipelineConfig::prepare(
        &args.input_folder,
        Some(&args.output_folder),
        &args.processed_folder,
        &args.log_folder,
    )?;
    let output_root = config
        .output
        .clone()
        .ok_or_else(|| DocflowError::InvalidArgument("output folder is required".to_string()))?;

    let log_path = logging::init(&config.log)?;
    info!(input = %config.input.display(), "Start processing");

    let tasks = FileCollector::new(&config.input).collect();
    if tasks.is_empty() {
        output::print_warning(&format!("No files found under {}", config.input.display()));
    } else {
        output::print_info(&format!("Found {} file(s) to process", tasks.len()));
    }

    let retry = RetryPolicy::default()
        .with(Category::Word, args.word_attempts)
        .with(Category::Excel, args.excel_attempts)
        .with(Category::PowerPoint, args.powerpoint_attempts);
    let timeout = args.timeout.map(Duration::from_secs);

    let mut runner = BatchRunner::new(LocalTree::new(output_root), Archiver::new(&config.archive), retry)
        .show_progress(!args.no_progress);
    for category in [Category::Word, Category::Excel, Category::PowerPoint] {
        if let Some(converter) = OfficeConverter::new(&args.soffice, category) {
            runner = runner.register(category, Box::new(converter.with_timeout(timeout)));
        }
    }

    let report = runner.run(&tasks);
    summarize(&report, &log_path, args.report.as_ref())?;
    Ok(report)
}
