//! # docflow - 批量文档转换与归档工具
//!
//! 遍历输入目录，逐个处理文件，并把每个文件移动到恰好一个终止位置。
//!
//! ## 子命令
//! - `convert` - Office 文档转换为 PDF（LibreOffice 无界面模式）
//! - `upload`  - 目录树上传到对象存储桶
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── config.rs  (根目录校验)
//!   │     ├── batch/     (遍历、执行、报告)
//!   │     ├── handlers/  (转换器、上传器、重试)
//!   │     ├── storage/   (输出位置、归档)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (输出、进度条、运行日志)
//!   └── error.rs    (错误处理)
//! ```
//!
//! ## 退出码
//! - 0: 所有文件均已处理
//! - 1: 致命错误（配置无效），未处理任何文件
//! - 2: 运行完成，但有文件处理失败并保留在输入目录

mod batch;
mod cli;
mod commands;
mod config;
mod error;
mod handlers;
mod models;
mod storage;
mod utils;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    match commands::run(cli.command) {
        Ok(report) if report.failed() > 0 => std::process::exit(2),
        Ok(_) => {}
        Err(e) => {
            utils::output::print_error(&format!("{}", e));
            std::process::exit(1);
        }
    }
}
