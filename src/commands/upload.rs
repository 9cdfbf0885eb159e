//! # upload 命令实现
//!
//! 递归上传目录树到对象存储桶。
//!
//! ## 功能
//! - 校验输入/归档/日志目录与桶的可访问性
//! - 桶中已存在的对象视为已完成（`--overwrite` 关闭该检查）
//! - 上传完成的源文件移入归档目录，失败的保留在原处
//!
//! ## 依赖关系
//! - 使用 `cli/upload.rs` 定义的参数
//! - 使用 `batch/`, `handlers/upload.rs`, `storage/bucket.rs`
//! - 使用 `utils/output.rs`, `utils/logging.rs`

use super::summarize;
use crate::batch::{BatchRunner, FileCollector, RunReport};
use crate::cli::upload::UploadArgs;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::handlers::{ObjectUploader, RetryPolicy};
use crate::models::Category;
use crate::storage::{Archiver, BucketClient, BucketSink};
use crate::utils::{logging, output};

use std::path::Path;
use tracing::info;

/// 执行 upload 命令
pub fn execute(args: UploadArgs) -> Result<RunReport> {
    output::print_header("Uploading files to object storage");

    let config = PipelineConfig::prepare(
        &args.input_folder,
        None,
        &args.processed_folder,
        &args.log_folder,
    )?;

    let client = BucketClient::new(&args.bucket_url)?;
    client.check_access()?;

    let log_path = logging::init(&config.log)?;
    info!(
        input = %config.input.display(),
        bucket = %client.host(),
        "Start processing"
    );

    let tasks = FileCollector::new(&config.input).collect();
    if tasks.is_empty() {
        output::print_warning(&format!("No files found under {}", config.input.display()));
    } else {
        output::print_info(&format!("Found {} file(s) to upload", tasks.len()));
    }

    let runner = build_runner(&client, &config.archive, args.attempts, args.overwrite)
        .show_progress(!args.no_progress);

    let report = runner.run(&tasks);
    summarize(&report, &log_path, args.report.as_ref())?;
    Ok(report)
}

/// 组装上传执行器
///
/// 上传不区分文档类别，每个类别都交给同一个上传器，共享同一个尝试次数。
fn build_runner(
    client: &BucketClient,
    archive: &Path,
    attempts: u32,
    overwrite: bool,
) -> BatchRunner<BucketSink> {
    Category::ALL.iter().fold(
        BatchRunner::new(
            BucketSink::new(client.clone(), overwrite),
            Archiver::new(archive),
            RetryPolicy::uniform(attempts),
        ),
        |runner, &category| runner.register(category, Box::new(ObjectUploader::new(client.clone()))),
    )
}
