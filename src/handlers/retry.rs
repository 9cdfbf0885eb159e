//! # 重试策略
//!
//! 每个类别独立配置尝试次数（至少 1 次）。
//! 瞬时失败在上限内重试；永久失败立即停止。
//! 用尽次数后返回最后一次错误，由调用方记录为单文件失败并继续运行。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 使用
//! - 被 `commands/` 根据命令行参数构建

use super::Handler;
use crate::error::HandlerError;
use crate::models::{Category, FileTask};

use std::collections::HashMap;
use tracing::warn;

/// 按类别的尝试次数
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    attempts: HashMap<Category, u32>,
}

impl RetryPolicy {
    /// 设置某类别的尝试次数（0 视为 1）
    pub fn with(mut self, category: Category, attempts: u32) -> Self {
        self.attempts.insert(category, attempts.max(1));
        self
    }

    /// 所有类别使用相同的尝试次数
    pub fn uniform(attempts: u32) -> Self {
        Category::ALL
            .iter()
            .fold(Self::default(), |policy, &c| policy.with(c, attempts))
    }

    pub fn attempts_for(&self, category: Category) -> u32 {
        self.attempts.get(&category).copied().unwrap_or(1)
    }

    /// 调用处理器直到成功、永久失败或次数用尽
    ///
    /// 返回结果和实际调用次数。
    pub fn invoke<D, H>(&self, handler: &H, task: &FileTask, dest: &D) -> (Result<(), HandlerError>, u32)
    where
        H: Handler<D> + ?Sized,
    {
        let max = self.attempts_for(task.category());
        let mut attempt = 0;

        loop {
            attempt += 1;
            match handler.handle(task, dest) {
                Ok(()) => return (Ok(()), attempt),
                Err(e) if e.is_transient() && attempt < max => {
                    warn!(
                        category = %task.category(),
                        "{} failed on {} (attempt {}/{}), retrying: {}",
                        handler.label(),
                        task.key(),
                        attempt,
                        max,
                        e
                    );
                }
                Err(e) => return (Err(e), attempt),
            }
        }
    }
}
