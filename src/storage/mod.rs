//! # 存储模块
//!
//! 抽象"输出位置"：本地镜像目录树或对象存储桶。
//!
//! ## 功能
//! - [`Sink`]: 计算目标位置、判断是否已完成、准备写入、原样复制
//! - [`Archiver`]: 把处理完的源文件移入归档目录，保持相对路径
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 使用
//! - 子模块: local, archive, bucket

pub mod archive;
pub mod bucket;
pub mod local;

pub use archive::Archiver;
pub use bucket::{BucketClient, BucketSink};
pub use local::LocalTree;

use crate::error::StorageError;
use crate::models::FileTask;
use std::path::Path;

/// 输出位置
///
/// 目标位置只由任务的相对路径（和可选的新扩展名）决定，
/// 因此重复运行总能找到上一次的产物。
pub trait Sink {
    /// 目标位置类型（本地路径或对象键）
    type Dest;

    /// 计算目标位置；`extension` 为 `Some` 时替换原扩展名
    fn locate(&self, task: &FileTask, extension: Option<&str>) -> Self::Dest;

    /// 用于日志和报告的描述
    fn describe(&self, dest: &Self::Dest) -> String;

    /// 目标是否已存在（已存在即视为已完成）
    fn exists(&self, dest: &Self::Dest) -> Result<bool, StorageError>;

    /// 写入前准备，例如创建父目录
    fn prepare(&self, dest: &Self::Dest) -> Result<(), StorageError>;

    /// 无处理器的文件：原样写入目标位置
    fn copy_raw(&self, source: &Path, dest: &Self::Dest) -> Result<(), StorageError>;

    /// 处理失败后清理残留的部分产物
    fn discard(&self, dest: &Self::Dest) -> Result<(), StorageError>;
}
