//! # 处理器模块
//!
//! 处理器是按类别注册的外部协作者：文档转换器或对象上传器。
//! 每次调用都是阻塞的，返回类型化的 [`HandlerError`]，从不越过流水线边界。
//!
//! ## 依赖关系
//! - 被 `batch/runner.rs` 调用
//! - 被 `commands/` 注册
//! - 子模块: office, retry, upload

pub mod office;
pub mod retry;
pub mod upload;

pub use office::OfficeConverter;
pub use retry::RetryPolicy;
pub use upload::ObjectUploader;

use crate::error::HandlerError;
use crate::models::FileTask;

/// 单类别处理器
///
/// `D` 是输出位置类型，与所用 `storage::Sink` 的 `Dest` 一致。
pub trait Handler<D> {
    /// 日志中显示的名称
    fn label(&self) -> &str;

    /// 产物扩展名；`None` 表示保持源文件名
    fn target_extension(&self) -> Option<&str> {
        None
    }

    /// 处理单个文件
    fn handle(&self, task: &FileTask, dest: &D) -> Result<(), HandlerError>;
}
