//! # 文件收集器
//!
//! 递归遍历输入根目录，为每个普通文件生成一个 `FileTask`。
//!
//! ## 功能
//! - 只收集普通文件，目录仅作为结构
//! - 不跟随符号链接
//! - 先完整收集再排序，处理过程中的移动不会影响遍历
//!
//! ## 依赖关系
//! - 被 `commands/` 调用
//! - 使用 `walkdir` 遍历目录

use crate::models::FileTask;

use std::path::PathBuf;
use tracing::warn;
use walkdir::WalkDir;

/// 文件收集器
pub struct FileCollector {
    /// 输入根目录
    root: PathBuf,
}

impl FileCollector {
    /// 创建新的文件收集器
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 收集所有文件，按相对路径排序
    pub fn collect(&self) -> Vec<FileTask> {
        let mut tasks: Vec<FileTask> = WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Cannot read entry during traversal: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(&self.root).ok()?.to_path_buf();
                Some(FileTask::new(entry.into_path(), relative))
            })
            .collect();

        tasks.sort_by(|a, b| a.relative().cmp(b.relative()));
        tasks
    }
}
