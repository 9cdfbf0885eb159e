//! # 数据模型模块
//!
//! 定义文件任务、类别与终止状态。
//!
//! ## 依赖关系
//! - 被 `batch/`, `handlers/`, `storage/` 使用
//! - 子模块: task, outcome

pub mod outcome;
pub mod task;

pub use outcome::{FailureKind, Stage, TaskFailure, TaskOutcome, TerminalState};
pub use task::{Category, FileTask};
