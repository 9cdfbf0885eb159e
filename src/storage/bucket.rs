//! # 对象存储桶
//!
//! 通过预认证 URL（pre-authenticated request）访问对象存储：
//! 对象键即输入目录中的相对路径（以 `/` 分隔）。
//!
//! ## 协议
//! - `HEAD <base>/<key>`: 2xx 表示对象已存在，404 表示尚未上传
//! - `PUT <base>/<key>`: 整文件上传
//!
//! 认证信息已包含在 URL 中，对本模块不透明。
//!
//! ## 依赖关系
//! - 实现 `storage::Sink`
//! - 被 `handlers/upload.rs`, `commands/upload.rs` 使用
//! - 使用 `reqwest` blocking 客户端

use super::Sink;
use crate::error::{DocflowError, HandlerError, Result, StorageError};
use crate::models::FileTask;

use reqwest::blocking::{Body, Client};
use reqwest::{StatusCode, Url};
use std::fs::File;
use std::path::Path;

/// 对象存储客户端
#[derive(Debug, Clone)]
pub struct BucketClient {
    http: Client,
    base: Url,
}

impl BucketClient {
    /// 解析桶 URL 并创建 HTTP 客户端
    pub fn new(bucket_url: &str) -> Result<Self> {
        let base = Url::parse(bucket_url).map_err(|e| DocflowError::InvalidBucketUrl {
            url: bucket_url.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(base.scheme(), "http" | "https") {
            return Err(DocflowError::InvalidBucketUrl {
                url: bucket_url.to_string(),
                reason: format!("unsupported scheme '{}'", base.scheme()),
            });
        }
        if base.cannot_be_a_base() {
            return Err(DocflowError::InvalidBucketUrl {
                url: bucket_url.to_string(),
                reason: "URL cannot carry object paths".to_string(),
            });
        }

        let http = Client::builder().build()?;
        Ok(Self { http, base })
    }

    /// 主机名；完整 URL 含访问令牌，不写入日志
    pub fn host(&self) -> String {
        self.base.host_str().unwrap_or_default().to_string()
    }

    /// 启动时确认桶可访问
    pub fn check_access(&self) -> Result<()> {
        let response = self
            .http
            .head(self.base.clone())
            .send()
            .map_err(|e| DocflowError::BucketUnavailable {
                host: self.host(),
                reason: e.without_url().to_string(),
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(DocflowError::BucketUnavailable {
                    host: self.host(),
                    reason: format!("access denied ({})", response.status()),
                })
            }
            _ => Ok(()),
        }
    }

    /// 对象 URL；每个路径段单独转义
    pub fn object_url(&self, key: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(key.split('/').filter(|s| !s.is_empty()));
        }
        url
    }

    /// 对象是否已存在
    pub fn exists(&self, key: &str) -> std::result::Result<bool, StorageError> {
        let response = self
            .http
            .head(self.object_url(key))
            .send()
            .map_err(|e| StorageError::Remote {
                key: key.to_string(),
                reason: e.without_url().to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(true)
        } else if status == StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(StorageError::Remote {
                key: key.to_string(),
                reason: format!("HEAD returned {}", status),
            })
        }
    }

    /// 上传整个文件
    pub fn put(&self, key: &str, source: &Path) -> std::result::Result<(), HandlerError> {
        let file = File::open(source).map_err(|e| {
            HandlerError::Permanent(format!("cannot open {}: {}", source.display(), e))
        })?;
        let len = file.metadata().map(|m| m.len()).map_err(|e| {
            HandlerError::Permanent(format!("cannot stat {}: {}", source.display(), e))
        })?;

        let response = self
            .http
            .put(self.object_url(key))
            .body(Body::sized(file, len))
            .send()
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() || e.is_connect() || e.is_request() {
                    HandlerError::Transient(e.to_string())
                } else {
                    HandlerError::Permanent(e.to_string())
                }
            })?;

        classify_status(response.status())
    }
}

/// PUT 响应状态 -> 处理结果
fn classify_status(status: StatusCode) -> std::result::Result<(), HandlerError> {
    if status.is_success() {
        Ok(())
    } else if status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
    {
        Err(HandlerError::Transient(format!("PUT returned {}", status)))
    } else {
        Err(HandlerError::Permanent(format!("PUT returned {}", status)))
    }
}

/// 以对象存储桶为输出位置
#[derive(Debug, Clone)]
pub struct BucketSink {
    client: BucketClient,
    overwrite: bool,
}

impl BucketSink {
    /// `overwrite` 为 true 时不检查对象是否已存在
    pub fn new(client: BucketClient, overwrite: bool) -> Self {
        Self { client, overwrite }
    }
}

impl Sink for BucketSink {
    type Dest = String;

    fn locate(&self, task: &FileTask, extension: Option<&str>) -> String {
        match extension {
            Some(ext) => FileTask::new(
                task.source().to_path_buf(),
                task.relative().with_extension(ext),
            )
            .key(),
            None => task.key(),
        }
    }

    fn describe(&self, dest: &String) -> String {
        // 桶 URL 中含有访问令牌，日志里只写对象键
        dest.clone()
    }

    fn exists(&self, dest: &String) -> std::result::Result<bool, StorageError> {
        if self.overwrite {
            return Ok(false);
        }
        self.client.exists(dest)
    }

    fn prepare(&self, _dest: &String) -> std::result::Result<(), StorageError> {
        Ok(())
    }

    /// 上传模式为所有类别注册了上传器，只有未注册处理器的类别才会走到这里
    fn copy_raw(&self, source: &Path, dest: &String) -> std::result::Result<(), StorageError> {
        self.client
            .put(dest, source)
            .map_err(|e| StorageError::Remote {
                key: dest.clone(),
                reason: e.to_string(),
            })
    }

    fn discard(&self, _dest: &String) -> std::result::Result<(), StorageError> {
        // PUT 是整体提交，失败不会留下部分对象
        Ok(())
    }
}
