//! # 本地输出目录树
//!
//! 输出文件位于 `root/<相对路径>`，转换类别替换扩展名（例如 `.docx` -> `.pdf`）。
//!
//! ## 依赖关系
//! - 实现 `storage::Sink`
//! - 被 `commands/convert.rs` 使用

use super::Sink;
use crate::error::StorageError;
use crate::models::FileTask;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// 镜像输入结构的本地目录树
#[derive(Debug, Clone)]
pub struct LocalTree {
    root: PathBuf,
}

impl LocalTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Sink for LocalTree {
    type Dest = PathBuf;

    fn locate(&self, task: &FileTask, extension: Option<&str>) -> PathBuf {
        let path = self.root.join(task.relative());
        match extension {
            Some(ext) => path.with_extension(ext),
            None => path,
        }
    }

    fn describe(&self, dest: &PathBuf) -> String {
        dest.display().to_string()
    }

    fn exists(&self, dest: &PathBuf) -> Result<bool, StorageError> {
        dest.try_exists().map_err(|e| StorageError::Inspect {
            path: dest.clone(),
            source: e,
        })
    }

    fn prepare(&self, dest: &PathBuf) -> Result<(), StorageError> {
        create_parent(dest)
    }

    fn copy_raw(&self, source: &Path, dest: &PathBuf) -> Result<(), StorageError> {
        fs::copy(source, dest).map_err(|e| StorageError::Copy {
            from: source.to_path_buf(),
            to: dest.clone(),
            source: e,
        })?;
        Ok(())
    }

    fn discard(&self, dest: &PathBuf) -> Result<(), StorageError> {
        match fs::remove_file(dest) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Inspect {
                path: dest.clone(),
                source: e,
            }),
        }
    }
}

/// 创建路径的所有父目录
pub fn create_parent(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| StorageError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })
        }
        _ => Ok(()),
    }
}
