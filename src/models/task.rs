//! # 文件任务数据模型
//!
//! 遍历输入目录时为每个普通文件创建一个 [`FileTask`]，创建后不可变，
//! 在一次运行中只被处理一次。
//!
//! ## 依赖关系
//! - 被 `batch/collector.rs` 创建
//! - 被 `batch/runner.rs`, `storage/`, `handlers/` 使用

use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// 文件类别（由扩展名决定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    /// Word 文档 (.doc, .docx)
    Word,
    /// Excel 表格 (.xls, .xlsx)
    Excel,
    /// PowerPoint 演示文稿 (.ppt, .pptx)
    PowerPoint,
    /// 无专用处理器，原样复制
    Unsupported,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Word,
        Category::Excel,
        Category::PowerPoint,
        Category::Unsupported,
    ];

    /// 根据扩展名分类（不区分大小写）
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("doc") | Some("docx") => Category::Word,
            Some("xls") | Some("xlsx") => Category::Excel,
            Some("ppt") | Some("pptx") => Category::PowerPoint,
            _ => Category::Unsupported,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Word => write!(f, "word"),
            Category::Excel => write!(f, "excel"),
            Category::PowerPoint => write!(f, "powerpoint"),
            Category::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// 单个待处理文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTask {
    /// 源文件绝对路径
    source: PathBuf,
    /// 相对于输入根目录的路径
    relative: PathBuf,
    /// 检测到的类别
    category: Category,
}

impl FileTask {
    pub fn new(source: PathBuf, relative: PathBuf) -> Self {
        let category = Category::from_path(&relative);
        Self {
            source,
            relative,
            category,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn relative(&self) -> &Path {
        &self.relative
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// 以 `/` 连接的相对路径，用于日志、报告和远端对象键
    pub fn key(&self) -> String {
        self.relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}
