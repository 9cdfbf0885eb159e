//! # 对象上传器
//!
//! 把源文件原样上传到桶中，对象键为输入目录中的相对路径。
//!
//! ## 依赖关系
//! - 实现 `handlers::Handler<String>`
//! - 使用 `storage/bucket.rs` 的 `BucketClient`
//! - 被 `commands/upload.rs` 注册

use super::Handler;
use crate::error::HandlerError;
use crate::models::FileTask;
use crate::storage::BucketClient;

/// 上传处理器
#[derive(Debug, Clone)]
pub struct ObjectUploader {
    client: BucketClient,
}

impl ObjectUploader {
    pub fn new(client: BucketClient) -> Self {
        Self { client }
    }
}

impl Handler<String> for ObjectUploader {
    fn label(&self) -> &str {
        "uploader"
    }

    fn handle(&self, task: &FileTask, dest: &String) -> Result<(), HandlerError> {
        self.client.put(dest, task.source())
    }
}
