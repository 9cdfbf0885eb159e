//! # 批量处理模块
//!
//! 发现文件、逐个处理、记录终止状态。
//!
//! ## 功能
//! - 递归收集输入目录中的文件
//! - 顺序处理：跳过 / 转换 / 复制 / 失败保留
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `walkdir` 遍历目录
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod report;
pub mod runner;

pub use collector::FileCollector;
pub use report::RunReport;
pub use runner::BatchRunner;
