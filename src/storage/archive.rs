//! # 归档
//!
//! 处理完成（成功、复制或已跳过）的源文件移入归档目录，保持相对路径。
//! 失败的源文件不经过这里，保留在输入目录等待下次运行。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 调用
//! - 使用 `storage/local.rs` 的目录创建

use super::local::create_parent;
use crate::error::StorageError;
use crate::models::FileTask;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// 归档器
#[derive(Debug, Clone)]
pub struct Archiver {
    root: PathBuf,
}

impl Archiver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 归档位置
    pub fn target(&self, task: &FileTask) -> PathBuf {
        self.root.join(task.relative())
    }

    /// 移动源文件到归档目录
    ///
    /// 失败时源文件保持原位，归档目录中不留副本。
    pub fn archive(&self, task: &FileTask) -> Result<PathBuf, StorageError> {
        let target = self.target(task);
        create_parent(&target)?;

        if target.is_file() {
            warn!("Replacing existing archive entry: {}", task.key());
            fs::remove_file(&target).map_err(|e| StorageError::Move {
                from: task.source().to_path_buf(),
                to: target.clone(),
                source: e,
            })?;
        }

        move_file(task.source(), &target)?;
        Ok(target)
    }
}

/// 整文件移动；跨设备时退化为复制后删除
fn move_file(from: &Path, to: &Path) -> Result<(), StorageError> {
    let rename_err = match fs::rename(from, to) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    if !from.is_file() {
        return Err(StorageError::Move {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            source: rename_err,
        });
    }

    copy_then_remove(from, to)
}

/// 复制到目标后删除源文件；任何一步失败都撤销副本
fn copy_then_remove(from: &Path, to: &Path) -> Result<(), StorageError> {
    let failed = |source| StorageError::Move {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };

    if let Err(e) = fs::copy(from, to) {
        let _ = fs::remove_file(to);
        return Err(failed(e));
    }

    if let Err(e) = fs::remove_file(from) {
        // 源文件删不掉就撤销副本，避免同时处于"已归档"和"保留"
        let _ = fs::remove_file(to);
        return Err(failed(e));
    }

    Ok(())
}
