//! # 运行配置
//!
//! 把命令行给出的根目录整理成显式配置，在处理任何文件之前完成校验。
//! 校验失败属于致命错误，整个运行中止。
//!
//! ## 校验规则
//! - 输入目录必须存在且是目录
//! - 输出、归档、日志目录不存在时创建
//! - 输出、归档、日志目录不能位于输入目录之内（否则会被再次遍历）
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `error.rs`

use crate::error::{DocflowError, Result};

use std::fs;
use std::path::{Path, PathBuf};

/// 已校验的目录配置
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 输入根目录
    pub input: PathBuf,
    /// 转换输出根目录（上传模式下为 `None`）
    pub output: Option<PathBuf>,
    /// 归档根目录
    pub archive: PathBuf,
    /// 运行日志目录
    pub log: PathBuf,
}

impl PipelineConfig {
    /// 校验并创建各根目录
    pub fn prepare(
        input: &Path,
        output: Option<&Path>,
        archive: &Path,
        log: &Path,
    ) -> Result<Self> {
        if !input.exists() {
            return Err(DocflowError::InputNotFound {
                path: input.to_path_buf(),
            });
        }
        if !input.is_dir() {
            return Err(DocflowError::InputNotDirectory {
                path: input.to_path_buf(),
            });
        }
        let input = canonical("input", input)?;

        // 先全部校验，再创建；被拒绝的配置不在磁盘上留下任何目录
        if let Some(dir) = output {
            check_outside("output", dir, &input)?;
        }
        check_outside("processed", archive, &input)?;
        check_outside("log", log, &input)?;

        let output = output.map(|dir| create_root("output", dir)).transpose()?;
        let archive = create_root("processed", archive)?;
        let log = create_root("log", log)?;

        Ok(Self {
            input,
            output,
            archive,
            log,
        })
    }
}

fn canonical(role: &'static str, path: &Path) -> Result<PathBuf> {
    fs::canonicalize(path).map_err(|e| DocflowError::RootUncreatable {
        role,
        path: path.to_path_buf(),
        source: e,
    })
}

/// 解析尚未存在的目录：规范化最近的已存在祖先，再接上其余部分
fn resolve_planned(role: &'static str, path: &Path) -> Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| DocflowError::RootUncreatable {
                role,
                path: path.to_path_buf(),
                source: e,
            })?
            .join(path)
    };

    let mut existing = absolute.as_path();
    let mut missing = Vec::new();
    while !existing.exists() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name);
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = canonical(role, existing)?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

/// 确认根目录不在输入目录内
fn check_outside(role: &'static str, path: &Path, input: &Path) -> Result<()> {
    if resolve_planned(role, path)?.starts_with(input) {
        return Err(DocflowError::RootInsideInput {
            role,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

fn create_root(role: &'static str, path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path).map_err(|e| DocflowError::RootUncreatable {
        role,
        path: path.to_path_buf(),
        source: e,
    })?;
    canonical(role, path)
}
