//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑：校验配置、初始化运行日志、组装执行器、汇总结果。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `config.rs`, `batch/`, `handlers/`, `storage/`, `utils/`
//! - 子模块: convert, upload

pub mod convert;
pub mod upload;

use crate::batch::RunReport;
use crate::cli::Commands;
use crate::error::Result;
use crate::utils::output;

use std::path::{Path, PathBuf};
use tracing::info;

/// 执行命令，返回本次运行的报告
pub fn run(cmd: Commands) -> Result<RunReport> {
    match cmd {
        Commands::Convert(args) => convert::execute(args),
        Commands::Upload(args) => upload::execute(args),
    }
}

/// 打印汇总、导出报告
fn summarize(report: &RunReport, log_path: &Path, csv_path: Option<&PathBuf>) -> Result<()> {
    use crate::models::TerminalState::*;

    info!(
        total = report.total(),
        processed = report.count(SuccessArchived),
        copied = report.count(CopiedArchived),
        skipped = report.count(SkippedArchived),
        failed = report.failed(),
        "Finish processing"
    );

    if let Some(table) = report.failure_table() {
        output::print_warning(&format!("{} file(s) failed and were left in place:", report.failed()));
        println!("{}", table);
    }

    if let Some(path) = csv_path {
        report.write_csv(path)?;
        output::print_info(&format!("Report written to '{}'", path.display()));
    }

    output::print_done(&format!(
        "{} file(s): {} processed, {} copied, {} skipped, {} failed",
        report.total(),
        report.count(SuccessArchived),
        report.count(CopiedArchived),
        report.count(SkippedArchived),
        report.failed()
    ));
    output::print_info(&format!("Run log: {}", log_path.display()));

    Ok(())
}
