//! # 任务结果数据模型
//!
//! 每个 `FileTask` 恰好终止于一个 [`TerminalState`]：
//!
//! ```text
//! DISCOVERED -> (目标已存在) -> SkippedArchived
//! DISCOVERED -> CLASSIFIED -> HANDLER_INVOKED -> SuccessArchived
//!                                            \-> FailedRetained
//! DISCOVERED -> CLASSIFIED(unsupported) -> CopiedArchived
//! ```
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 创建
//! - 被 `batch/report.rs` 汇总

use super::task::Category;
use serde::Serialize;

/// 终止状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TerminalState {
    /// 目标已存在，跳过并归档
    SkippedArchived,
    /// 处理器成功，已归档
    SuccessArchived,
    /// 无处理器，原样复制后归档
    CopiedArchived,
    /// 失败，源文件保留在输入目录
    FailedRetained,
}

impl TerminalState {
    /// 源文件是否已移入归档目录
    pub fn is_archived(&self) -> bool {
        !matches!(self, TerminalState::FailedRetained)
    }
}

impl std::fmt::Display for TerminalState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TerminalState::SkippedArchived => write!(f, "skipped"),
            TerminalState::SuccessArchived => write!(f, "converted"),
            TerminalState::CopiedArchived => write!(f, "copied"),
            TerminalState::FailedRetained => write!(f, "failed"),
        }
    }
}

/// 失败发生的步骤
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    /// 检查目标是否已存在
    Check,
    /// 创建目标目录
    Prepare,
    /// 调用处理器
    Handle,
    /// 移入归档目录
    Archive,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Check => write!(f, "check"),
            Stage::Prepare => write!(f, "prepare"),
            Stage::Handle => write!(f, "handle"),
            Stage::Archive => write!(f, "archive"),
        }
    }
}

/// 失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    TransientExternal,
    PermanentExternal,
    Filesystem,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::TransientExternal => write!(f, "transient"),
            FailureKind::PermanentExternal => write!(f, "permanent"),
            FailureKind::Filesystem => write!(f, "filesystem"),
        }
    }
}

/// 单文件失败详情
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
}

/// 单文件处理结果
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    /// 以 `/` 连接的相对路径
    pub relative: String,
    pub category: Category,
    pub state: TerminalState,
    /// 输出位置（本地路径或对象键）
    pub destination: String,
    /// 处理器调用次数
    pub attempts: u32,
    pub failure: Option<TaskFailure>,
}
