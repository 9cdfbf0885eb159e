//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `convert`: Office 文档批量转换为 PDF
//! - `upload`: 目录树批量上传到对象存储
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: convert, upload

pub mod convert;
pub mod upload;

use clap::{Parser, Subcommand};

/// docflow - 批量文档转换与归档工具
#[derive(Parser)]
#[command(name = "docflow")]
#[command(version)]
#[command(about = "Batch-convert office documents to PDF and upload folder trees to object storage", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Convert Word, Excel and PowerPoint files under a folder to PDF
    Convert(convert::ConvertArgs),

    /// Upload every file under a folder to an object-storage bucket
    Upload(upload::UploadArgs),
}
